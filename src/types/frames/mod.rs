pub mod temperature_frame;
