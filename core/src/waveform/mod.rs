pub mod block;
pub mod raster;

pub use block::block_wave;
pub use raster::{
    raster_frame, repeat_wave, rotate_x_and_y, x_values_single_period, y_values_staircase,
    RasterConfig, RasterFrame, SinglePeriod,
};
