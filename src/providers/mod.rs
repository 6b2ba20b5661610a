pub mod exchange_rate_api;
pub mod metal_price_api;
pub mod util;

pub use exchange_rate_api::ExchangeRateApiProvider;
pub use metal_price_api::MetalPriceApiProvider;
