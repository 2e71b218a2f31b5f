pub mod admindtos;
pub mod reportdtos;
pub mod userdtos;
