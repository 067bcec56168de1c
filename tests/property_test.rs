use proptest::prelude::*;
use storefront_sync::domain::id::{OrderId, ProductId, ReceiptToken};
use storefront_sync::domain::money::MoneyAmount;
use storefront_sync::domain::order::{OrderStatus, OrderTotals, PricedLine, PricingRules};
use storefront_sync::domain::payment::PaymentStatus;
use storefront_sync::domain::signature::{payment_signature, verify_payment_signature};
use storefront_sync::domain::webhook::GatewayEvent;

fn arb_payment_status() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Processing),
        Just(PaymentStatus::Succeeded),
        Just(PaymentStatus::Failed),
    ]
}

fn arb_line() -> impl Strategy<Value = PricedLine> {
    (1i64..1_000, 1i32..20, 0i64..10_000_000).prop_map(|(product, qty, price)| PricedLine {
        product_id: ProductId::new(product),
        qty,
        unit_price: MoneyAmount::new(price).unwrap(),
    })
}

proptest! {
    /// total == subtotal + shipping + tax, for any basket and tax rate.
    #[test]
    fn totals_add_up(
        lines in prop::collection::vec(arb_line(), 1..10),
        bps in 0u32..5_000,
    ) {
        let rules = PricingRules { tax_rate_bps: bps, ..PricingRules::default() };
        let t = OrderTotals::compute(&lines, &rules).unwrap();

        let expected_subtotal: i64 = lines
            .iter()
            .map(|l| l.unit_price.minor_units() * i64::from(l.qty))
            .sum();
        prop_assert_eq!(t.subtotal.minor_units(), expected_subtotal);
        prop_assert_eq!(
            t.total.minor_units(),
            t.subtotal.minor_units() + t.shipping_fee.minor_units() + t.tax_amount.minor_units()
        );
        if t.subtotal > rules.free_shipping_above {
            prop_assert_eq!(t.shipping_fee, MoneyAmount::ZERO);
        } else {
            prop_assert_eq!(t.shipping_fee, rules.shipping_fee);
        }
    }

    /// Tax never strays more than half a minor unit from the exact value.
    #[test]
    fn tax_rounding_is_within_half_unit(subtotal in 0i64..1_000_000_000_000, bps in 0u32..10_000) {
        let tax = MoneyAmount::new(subtotal).unwrap().percent_bps(bps).unwrap();
        let exact = i128::from(subtotal) * i128::from(bps);
        let diff = (i128::from(tax.minor_units()) * 10_000 - exact).abs();
        prop_assert!(diff <= 5_000, "tax {tax} for {subtotal} @ {bps}bps");
    }

    /// Any sequence of payment outcomes: once paid, always paid.
    #[test]
    fn ratchet_is_monotonic(events in prop::collection::vec(arb_payment_status(), 1..30)) {
        let mut status = OrderStatus::Pending;
        let mut seen_success = false;
        for outcome in &events {
            if let Some(next) = status.after_payment(*outcome) {
                status = next;
            }
            seen_success |= *outcome == PaymentStatus::Succeeded;
            if seen_success {
                prop_assert_eq!(status, OrderStatus::Paid);
            }
        }
        if !seen_success {
            prop_assert_ne!(status, OrderStatus::Paid);
        }
    }

    /// The receipt token maps back to the order that produced it.
    #[test]
    fn receipt_token_roundtrip(id in 1i64..i64::MAX) {
        let token = ReceiptToken::for_order(OrderId::new(id)).to_string();
        prop_assert_eq!(ReceiptToken::parse(&token).map(|t| t.order_id()), Some(OrderId::new(id)));
    }

    /// Arbitrary text never parses as a receipt unless it has the exact shape.
    #[test]
    fn receipt_token_rejects_noise(raw in "\\PC{0,24}") {
        if let Some(token) = ReceiptToken::parse(&raw) {
            prop_assert_eq!(token.to_string(), raw);
        }
    }

    /// A signature for one payment id never verifies another.
    #[test]
    fn payment_signature_is_bound_to_ids(
        intent in "[a-zA-Z0-9_]{1,20}",
        pay in "[a-zA-Z0-9_]{1,20}",
        other in "[a-zA-Z0-9_]{1,20}",
    ) {
        let sig = payment_signature(&intent, &pay, "secret").unwrap();
        prop_assert!(verify_payment_signature(&intent, &pay, &sig, "secret").is_ok());
        if other != pay {
            prop_assert!(verify_payment_signature(&intent, &other, &sig, "secret").is_err());
        }
    }

    /// Event decoding never panics on arbitrary bytes.
    #[test]
    fn event_decoding_is_total(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = GatewayEvent::from_slice(&body);
    }
}
