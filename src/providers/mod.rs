pub mod caching;
pub mod http;
pub mod popular;
pub mod switcheo;
pub mod util;
