use crate::error::{ChainError, Result};
use crate::models::{ExpiryRow, StrikeRow};
use chrono::{Duration, NaiveDate};
use image::ImageFormat;
use plotters::backend::BitMapBackend;
use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

fn save_png(buffer: &[u8], output_path: &Path) -> Result<()> {
    image::save_buffer_with_format(
        output_path,
        buffer,
        WIDTH,
        HEIGHT,
        image::ExtendedColorType::Rgb8,
        ImageFormat::Png,
    )
    .map_err(|e| ChainError::PlotError(e.to_string()))?;
    Ok(())
}

/// Axis bounds with 5% padding. Callers check for an empty series first;
/// an empty input degenerates to a unit span around 0.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        min = 0.0;
        max = 0.0;
    }
    let span = (max - min).max(1.0);
    (min - 0.05 * span, max + 0.05 * span)
}

/// Plot call and put implied volatility against strike for one expiry group,
/// with a marker at the underlying price. Rows with zero (unknown) IV are
/// skipped.
pub fn plot_volatility_skew<P: AsRef<Path>>(
    rows: &[ExpiryRow],
    underlying_price: f64,
    title: &str,
    output_path: P,
) -> Result<()> {
    let call_points: Vec<(f64, f64)> = rows
        .iter()
        .filter(|r| r.call_iv > 0.0)
        .map(|r| (r.strike, r.call_iv))
        .collect();
    let put_points: Vec<(f64, f64)> = rows
        .iter()
        .filter(|r| r.put_iv > 0.0)
        .map(|r| (r.strike, r.put_iv))
        .collect();

    if call_points.is_empty() && put_points.is_empty() {
        return Err(ChainError::PlotError(
            "no valid data points for volatility skew plot".to_string(),
        ));
    }

    let all = call_points.iter().chain(put_points.iter());
    let (strike_min, strike_max) = padded_range(
        all.clone()
            .map(|(s, _)| *s)
            .chain(std::iter::once(underlying_price)),
    );
    let (iv_min, iv_max) = padded_range(all.map(|(_, v)| *v));
    let iv_min = iv_min.max(0.0);

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(strike_min..strike_max, iv_min..iv_max)
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("Strike Price")
            .y_desc("Implied Volatility (%)")
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(call_points.iter().copied(), &BLUE))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Call IV")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        chart
            .draw_series(
                call_points
                    .iter()
                    .map(|&(s, v)| Circle::new((s, v), 3, BLUE.filled())),
            )
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(put_points.iter().copied(), &RED))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Put IV")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart
            .draw_series(
                put_points
                    .iter()
                    .map(|&(s, v)| Circle::new((s, v), 3, RED.filled())),
            )
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(
                vec![(underlying_price, iv_min), (underlying_price, iv_max)],
                &BLACK,
            ))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Underlying")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        root.present()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;
    }

    save_png(&buffer, output_path.as_ref())
}

/// Plot call and put implied volatility across expiries for one strike
/// group. Rows with zero (unknown) IV are skipped.
pub fn plot_term_structure<P: AsRef<Path>>(
    rows: &[StrikeRow],
    title: &str,
    output_path: P,
) -> Result<()> {
    let mut rows: Vec<&StrikeRow> = rows.iter().collect();
    rows.sort_by_key(|r| r.expiry);

    let call_points: Vec<(NaiveDate, f64)> = rows
        .iter()
        .filter(|r| r.call_iv > 0.0)
        .map(|r| (r.expiry, r.call_iv))
        .collect();
    let put_points: Vec<(NaiveDate, f64)> = rows
        .iter()
        .filter(|r| r.put_iv > 0.0)
        .map(|r| (r.expiry, r.put_iv))
        .collect();

    if call_points.is_empty() && put_points.is_empty() {
        return Err(ChainError::PlotError(
            "no valid data points for term structure plot".to_string(),
        ));
    }

    let (mut date_min, mut date_max) = call_points
        .iter()
        .chain(put_points.iter())
        .map(|(d, _)| *d)
        .fold((NaiveDate::MAX, NaiveDate::MIN), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
    if date_min == date_max {
        // a single expiry still needs a non-degenerate axis
        date_min = date_min - Duration::days(1);
        date_max = date_max + Duration::days(1);
    }
    let (iv_min, iv_max) = padded_range(
        call_points
            .iter()
            .chain(put_points.iter())
            .map(|(_, v)| *v),
    );
    let iv_min = iv_min.max(0.0);

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(date_min..date_max, iv_min..iv_max)
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("Expiry")
            .y_desc("Implied Volatility (%)")
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(call_points.iter().copied(), &BLUE))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Call IV")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        chart
            .draw_series(
                call_points
                    .iter()
                    .map(|&(d, v)| Circle::new((d, v), 3, BLUE.filled())),
            )
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(put_points.iter().copied(), &RED))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Put IV")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart
            .draw_series(
                put_points
                    .iter()
                    .map(|&(d, v)| Circle::new((d, v), 3, RED.filled())),
            )
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        root.present()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;
    }

    save_png(&buffer, output_path.as_ref())
}

/// Plot call and put open interest against strike for one expiry group,
/// with a marker at the underlying price.
pub fn plot_open_interest<P: AsRef<Path>>(
    rows: &[ExpiryRow],
    underlying_price: f64,
    title: &str,
    output_path: P,
) -> Result<()> {
    if rows.is_empty() {
        return Err(ChainError::PlotError(
            "no valid data points for open interest plot".to_string(),
        ));
    }

    let call_points: Vec<(f64, f64)> = rows.iter().map(|r| (r.strike, r.call_oi as f64)).collect();
    let put_points: Vec<(f64, f64)> = rows.iter().map(|r| (r.strike, r.put_oi as f64)).collect();

    let (strike_min, strike_max) = padded_range(
        call_points
            .iter()
            .map(|(s, _)| *s)
            .chain(std::iter::once(underlying_price)),
    );
    let oi_max = call_points
        .iter()
        .chain(put_points.iter())
        .map(|(_, v)| *v)
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(strike_min..strike_max, 0.0..oi_max * 1.1)
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("Strike Price")
            .y_desc("Open Interest")
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(call_points.iter().copied(), &BLUE))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Call OI")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        chart
            .draw_series(
                call_points
                    .iter()
                    .map(|&(s, v)| Circle::new((s, v), 3, BLUE.filled())),
            )
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(put_points.iter().copied(), &RED))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Put OI")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart
            .draw_series(
                put_points
                    .iter()
                    .map(|&(s, v)| Circle::new((s, v), 3, RED.filled())),
            )
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(
                vec![(underlying_price, 0.0), (underlying_price, oi_max * 1.1)],
                &BLACK,
            ))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label("Underlying")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;

        root.present()
            .map_err(|e| ChainError::PlotError(e.to_string()))?;
    }

    save_png(&buffer, output_path.as_ref())
}
