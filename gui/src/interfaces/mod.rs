pub mod drivesim_interface;
