#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for the LED matrix.

mod common;

use common::RecordingWriter;
use display_envoy::Error;
use display_envoy::color::{BLACK, Rgb, Rgb888, colors, dim};
use display_envoy::driver::{Current, PixelDriver, PowerBudget, StripDriver};
use display_envoy::layout::Topology;
use display_envoy::matrix::{LedMatrix, MatrixConfig, SharedMatrix};
use embedded_graphics::{
    pixelcolor::RgbColor,
    prelude::{OriginDimensions, Point, Primitive, Size},
    primitives::{Line, PrimitiveStyle, Rectangle},
    Drawable,
};

const RED: Rgb = colors::RED;
const GREEN: Rgb = colors::LIME;

type TestMatrix<const N: usize> = LedMatrix<StripDriver<RecordingWriter, N>>;

fn matrix_4x2(topology: Topology) -> TestMatrix<8> {
    let config = MatrixConfig {
        width: 4,
        height: 2,
        topology,
        power: PowerBudget::new(Current::Unlimited, 60),
    };
    LedMatrix::new(config, StripDriver::new(RecordingWriter::default())).expect("valid matrix")
}

#[test]
fn default_config_is_32_by_8_column_major_alternating() {
    let config = MatrixConfig::default();
    assert_eq!((config.width, config.height), (32, 8));
    assert_eq!(config.topology, Topology::ColumnMajorAlternating);
    assert_eq!(config.power.supply, Current::Milliamps(3500));
    assert_eq!(config.power.per_led_ma, 60);

    let matrix: TestMatrix<256> =
        LedMatrix::new(config, StripDriver::new(RecordingWriter::default())).expect("fits");
    assert_eq!(matrix.layout(), Topology::ColumnMajorAlternating);
    assert_eq!(matrix.size(), Size::new(32, 8));
}

#[test]
fn new_rejects_zero_or_oversized_dimensions() {
    for (width, height) in [(0, 2), (4, 0), (5, 2), (4, 3)] {
        let config = MatrixConfig {
            width,
            height,
            ..MatrixConfig::default()
        };
        let result: Result<TestMatrix<8>, _> =
            LedMatrix::new(config, StripDriver::new(RecordingWriter::default()));
        assert!(
            matches!(result, Err(Error::InvalidDimensions { capacity: 8, .. })),
            "{width}x{height}"
        );
    }
}

#[test]
fn draw_pixel_writes_the_mapped_strip_index() {
    let mut matrix = matrix_4x2(Topology::RowMajorAlternating);
    matrix.draw_pixel(0, 1, RED);
    assert_eq!(matrix.driver().pixel_color(7), RED);
    assert_eq!(matrix.color(0, 1), RED);
    assert_eq!(matrix.map(0, 1), 7);
}

#[test]
fn draw_pixel_off_panel_is_a_no_op() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 2), (i32::MAX, i32::MIN)] {
        matrix.draw_pixel(x, y, RED);
    }
    assert!(matrix.driver().frame().iter().all(|color| *color == BLACK));
}

#[test]
fn dim_pixel_off_panel_leaves_edge_pixels_alone() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    matrix.draw_pixel(0, 0, RED);
    matrix.draw_pixel(3, 1, RED);

    // Each of these would clamp onto (0, 0) or (3, 1).
    let off_panel = [
        (-1, 0),
        (0, -1),
        (4, 1),
        (3, 2),
        (i32::MIN, i32::MIN),
        (i32::MAX, i32::MAX),
    ];
    for (x, y) in off_panel {
        matrix.dim_pixel(x, y, 255);
    }

    assert_eq!(matrix.color(0, 0), RED);
    assert_eq!(matrix.color(3, 1), RED);
}

#[test]
fn dim_scales_each_channel_by_the_kept_fraction() {
    let white = Rgb::new(255, 255, 255);
    for ratio in 0..=u8::MAX {
        let kept = u8::MAX.saturating_sub(ratio);
        assert_eq!(dim(white, ratio), Rgb::new(kept, kept, kept), "ratio {ratio}");
    }
}

#[test]
fn color_clamps_like_map() {
    let mut matrix = matrix_4x2(Topology::ColumnMajor);
    matrix.draw_pixel(3, 1, GREEN);
    assert_eq!(matrix.color(10, 10), GREEN);
    assert_eq!(matrix.color(-3, -3), BLACK);
}

#[test]
fn map_probe_reports_sentinel() {
    let matrix = matrix_4x2(Topology::RowMajor);
    assert_eq!(matrix.map_probe(4, 0), 8);
    assert_eq!(matrix.map_probe(3, 1), 7);
}

#[test]
fn dim_pixel_scales_toward_black() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    matrix.draw_pixel(1, 0, Rgb::new(200, 100, 10));
    matrix.dim_pixel(1, 0, 0);
    assert_eq!(matrix.color(1, 0), Rgb::new(200, 100, 10));
    matrix.dim_pixel(1, 0, 128);
    assert_eq!(matrix.color(1, 0), Rgb::new(99, 49, 4));
    matrix.dim_pixel(1, 0, 255);
    assert_eq!(matrix.color(1, 0), BLACK);
}

#[test]
fn set_layout_changes_later_mappings_only() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    matrix.draw_pixel(0, 1, RED);
    assert_eq!(matrix.driver().pixel_color(4), RED);

    matrix.set_layout(Topology::RowMajorAlternating);
    assert_eq!(matrix.layout(), Topology::RowMajorAlternating);
    // Stored colors stay where they were written.
    assert_eq!(matrix.driver().pixel_color(4), RED);
    assert_eq!(matrix.map(0, 1), 7);
}

#[test]
fn set_layout_id_ignores_unknown_ids() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    matrix.set_layout_id(13);
    assert_eq!(matrix.layout(), Topology::ColumnMajorAlternating90);
    matrix.set_layout_id(16);
    assert_eq!(matrix.layout(), Topology::ColumnMajorAlternating90);
    matrix.set_layout_id(200);
    assert_eq!(matrix.layout(), Topology::ColumnMajorAlternating90);
}

#[test]
fn brightness_is_scaled_by_power_budget() {
    let config = MatrixConfig::default();
    let mut matrix: TestMatrix<256> =
        LedMatrix::new(config, StripDriver::new(RecordingWriter::default())).expect("fits");

    matrix.set_brightness(255);
    assert_eq!(matrix.brightness(), 255);
    // 3500 * 255 / (60 * 256)
    assert_eq!(matrix.driver().brightness(), 58);

    matrix.set_brightness(0);
    assert_eq!(matrix.driver().brightness(), 0);
}

#[test]
fn brightness_saturates_when_supply_exceeds_demand() {
    let config = MatrixConfig {
        width: 4,
        height: 2,
        topology: Topology::RowMajor,
        power: PowerBudget::new(Current::Milliamps(3500), 60),
    };
    let mut matrix: TestMatrix<8> =
        LedMatrix::new(config, StripDriver::new(RecordingWriter::default())).expect("fits");
    matrix.set_brightness(200);
    assert_eq!(matrix.driver().brightness(), 255);
}

#[test]
fn unlimited_current_passes_brightness_through() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    matrix.set_brightness(77);
    assert_eq!(matrix.driver().brightness(), 77);
    assert_eq!(matrix.power().supply, Current::Unlimited);
}

#[test]
fn show_pushes_frame_in_strip_order() {
    let mut matrix = matrix_4x2(Topology::ColumnMajor);
    matrix.begin().expect("begin");
    matrix.draw_pixel(1, 0, RED);
    matrix.show().expect("show");
    assert!(matrix.is_ready());

    let writer = matrix.into_driver().into_writer();
    assert_eq!(writer.frames.len(), 2);
    assert!(writer.frames[0].iter().all(|color| *color == BLACK));
    assert_eq!(writer.frames[1][2], RED);
}

#[test]
fn clear_blanks_every_pixel() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    matrix.draw_pixel(2, 1, RED);
    matrix.clear();
    assert!(matrix.driver().frame().iter().all(|color| *color == BLACK));
}

#[test]
fn draw_target_clips_shapes_to_the_panel() {
    let mut matrix = matrix_4x2(Topology::RowMajor);
    Line::new(Point::new(-2, 1), Point::new(10, 1))
        .into_styled(PrimitiveStyle::with_stroke(Rgb888::GREEN, 1))
        .draw(&mut matrix)
        .expect("infallible");

    for x in 0..4 {
        assert_eq!(matrix.color(x, 1), GREEN);
        assert_eq!(matrix.color(x, 0), BLACK);
    }

    Rectangle::new(Point::new(0, 0), Size::new(4, 2))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
        .draw(&mut matrix)
        .expect("infallible");
    assert!(matrix.driver().frame().iter().all(|color| *color == RED));
}

#[test]
fn shared_matrix_swaps_layout_under_lock() {
    let shared = SharedMatrix::new(matrix_4x2(Topology::RowMajor));
    shared.set_layout(Topology::ColumnMajor);
    assert_eq!(shared.layout(), Topology::ColumnMajor);

    let index = shared.lock(|matrix| {
        matrix.draw_pixel(1, 1, RED);
        matrix.map(1, 1)
    });
    assert_eq!(index, 3);
    assert_eq!(shared.into_inner().driver().pixel_color(3), RED);
}

#[test]
fn matrix_config_round_trips_through_json() {
    let config = MatrixConfig {
        width: 16,
        height: 16,
        topology: Topology::RowMajorAlternating270,
        power: PowerBudget::new(Current::Milliamps(2000), 50),
    };
    let json = serde_json::to_string(&config).expect("serialize");
    let restored: MatrixConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, config);
}
