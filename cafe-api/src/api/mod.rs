pub mod dashboard;
pub mod orders;
pub mod products;

use rust_decimal::Decimal;
use validator::ValidationError;

/// 价格必须为正, 商品目录和行项目快照共用
pub(crate) fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("price_must_be_positive");
        err.message = Some("Price must be positive".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_price_passes() {
        assert!(validate_price(&"0.01".parse().unwrap()).is_ok());
    }

    #[test]
    fn zero_and_negative_prices_fail() {
        assert!(validate_price(&Decimal::ZERO).is_err());
        assert!(validate_price(&"-2.50".parse().unwrap()).is_err());
    }
}
