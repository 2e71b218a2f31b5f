pub mod cursor;
pub mod reportmodel;
pub mod stationmodel;
pub mod usermodel;
