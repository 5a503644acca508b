//! 订单金额计算。所有变更路径都必须经过这里, 保证 total_amount 不会因为
//! 各处各算一套而出现偏差。

use rust_decimal::Decimal;

use super::models::order::NewLineItem;

pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

pub fn order_total(items: &[NewLineItem]) -> Decimal {
    items
        .iter()
        .fold(Decimal::ZERO, |acc, item| {
            acc + line_total(item.price, item.quantity)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(price: &str, quantity: i32) -> NewLineItem {
        NewLineItem {
            product_id: 1,
            quantity,
            price: dec(price),
        }
    }

    #[test]
    fn line_total_multiplies_exactly() {
        assert_eq!(line_total(dec("2.50"), 2), dec("5.00"));
        assert_eq!(line_total(dec("3.25"), 1), dec("3.25"));
    }

    #[test]
    fn order_total_sums_line_items() {
        let items = vec![item("2.50", 2), item("3.25", 1)];
        assert_eq!(order_total(&items), dec("8.25"));
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn many_small_items_do_not_drift() {
        // 0.10 累加 1000 次在浮点下会产生误差, 定点数必须精确
        let items: Vec<_> = (0..1000).map(|_| item("0.10", 1)).collect();
        assert_eq!(order_total(&items), dec("100.00"));
    }

    #[test]
    fn same_product_may_appear_twice() {
        let items = vec![item("2.50", 1), item("2.50", 3)];
        assert_eq!(order_total(&items), dec("10.00"));
    }
}
