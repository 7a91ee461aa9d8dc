use crate::format::{format_brl, LOW_STOCK_THRESHOLD};
use crate::models::Product;
use std::fmt;
use tracing::warn;

/// Overview of the product catalogue's stock levels
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StockSummary<'a> {
    pub(crate) total_products: usize,
    pub(crate) total_value: f64,
    pub(crate) average_price: f64,
    /// Products below [`LOW_STOCK_THRESHOLD`], in catalogue order
    pub(crate) low_stock: Vec<&'a Product>,
}

impl<'a> StockSummary<'a> {
    pub(crate) fn from_products(products: &'a [Product]) -> StockSummary<'a> {
        let total_value = products
            .iter()
            .map(|p| p.price * stock_as_f64(p))
            .sum();
        let price_sum: f64 = products.iter().map(|p| p.price).sum();
        let average_price = match u32::try_from(products.len()) {
            Ok(n) if n > 0 => price_sum / f64::from(n),
            _ => 0.0,
        };
        StockSummary {
            total_products: products.len(),
            total_value,
            average_price,
            low_stock: products.iter().filter(|p| is_low_stock(p)).collect(),
        }
    }
}

pub(crate) fn is_low_stock(product: &Product) -> bool {
    product.stock < LOW_STOCK_THRESHOLD
}

// Quantities beyond the backend's 32-bit column are clamped rather than lost
fn stock_as_f64(product: &Product) -> f64 {
    match i32::try_from(product.stock) {
        Ok(n) => f64::from(n),
        Err(_) => {
            warn!(id = product.id, stock = product.stock, "stock quantity out of range; clamping");
            f64::from(if product.stock < 0 { i32::MIN } else { i32::MAX })
        }
    }
}

impl fmt::Display for StockSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Products:          {}", self.total_products)?;
        writeln!(f, "Low stock (< {LOW_STOCK_THRESHOLD}):   {}", self.low_stock.len())?;
        writeln!(f, "Stock value:       {}", format_brl(self.total_value))?;
        writeln!(f, "Average price:     {}", format_brl(self.average_price))?;
        for p in &self.low_stock {
            writeln!(f, "  {:>6}  {:<30} {:>5}", p.id, p.name, p.stock)?;
        }
        Ok(())
    }
}
