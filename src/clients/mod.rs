pub mod daymet;
pub mod earthdata;
pub mod elevation;
pub mod http;
pub mod open_meteo;
pub mod openai;
pub mod openweather;
