pub mod bitkub;
