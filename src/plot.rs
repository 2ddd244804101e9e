//! Metric plot rendering
//!
//! Renders the confusion-matrix cell grid, the ROC polyline, and the
//! per-epoch training curves to PNG files. These renderers are
//! intentionally plain: cells are shaded by row-normalized frequency and
//! curves are drawn as polylines on a white canvas, with no text
//! annotation, so no font resources are required.

use crate::metrics::{ConfusionMatrix, RocCurve};
use crate::train::EpochRecord;
use crate::Result;
use image::{Rgb, RgbImage};
use std::path::Path;

const CELL_SIZE: u32 = 64;
const CANVAS: u32 = 512;
const MARGIN: u32 = 32;

/// Save a confusion matrix as a shaded cell grid
pub fn save_confusion_matrix(cm: &ConfusionMatrix, path: &Path) -> Result<()> {
    let n = cm.n_classes() as u32;
    let side = n * CELL_SIZE + 2;
    let mut img = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));

    for row in 0..n {
        for col in 0..n {
            let value = cm.normalized(row as usize, col as usize);
            let shade = shade_purple(value);
            fill_rect(
                &mut img,
                col * CELL_SIZE + 1,
                row * CELL_SIZE + 1,
                CELL_SIZE - 1,
                CELL_SIZE - 1,
                shade,
            );
        }
    }

    img.save(path)?;
    Ok(())
}

/// Save a ROC curve as a polyline over the chance diagonal
pub fn save_roc_curve(roc: &RocCurve, path: &Path) -> Result<()> {
    let mut img = RgbImage::from_pixel(CANVAS, CANVAS, Rgb([255, 255, 255]));

    // Chance diagonal
    draw_line(
        &mut img,
        plot_point(0.0, 0.0),
        plot_point(1.0, 1.0),
        Rgb([0, 0, 128]),
    );

    let points: Vec<(u32, u32)> = roc
        .fpr
        .iter()
        .zip(&roc.tpr)
        .map(|(&x, &y)| plot_point(x, y))
        .collect();
    for pair in points.windows(2) {
        draw_line(&mut img, pair[0], pair[1], Rgb([139, 0, 0]));
    }

    img.save(path)?;
    Ok(())
}

/// Save the run's loss and accuracy curves side by side
///
/// Left panel: train and validation loss, scaled to the largest loss
/// seen. Right panel: train and validation accuracy on [0, 1]. Training
/// series are drawn red, validation green. The file is overwritten as
/// the history grows.
pub fn save_training_curves(history: &[EpochRecord], path: &Path) -> Result<()> {
    let mut img = RgbImage::from_pixel(2 * CANVAS, CANVAS, Rgb([255, 255, 255]));

    let max_loss = history
        .iter()
        .map(|r| r.train_loss.max(r.val_loss))
        .fold(0.0_f32, f32::max)
        .max(f32::EPSILON);

    let train = Rgb([178, 24, 43]);
    let val = Rgb([27, 120, 55]);
    draw_series(&mut img, history, |r| r.train_loss / max_loss, 0, train);
    draw_series(&mut img, history, |r| r.val_loss / max_loss, 0, val);
    draw_series(&mut img, history, |r| r.train_acc, CANVAS, train);
    draw_series(&mut img, history, |r| r.val_acc, CANVAS, val);

    img.save(path)?;
    Ok(())
}

fn draw_series(
    img: &mut RgbImage,
    history: &[EpochRecord],
    value: impl Fn(&EpochRecord) -> f32,
    x_offset: u32,
    color: Rgb<u8>,
) {
    let extent = (CANVAS - 2 * MARGIN) as f32;
    let points: Vec<(u32, u32)> = history
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let x = if history.len() < 2 {
                0.0
            } else {
                i as f32 / (history.len() - 1) as f32
            };
            let y = value(record).clamp(0.0, 1.0);
            (
                x_offset + MARGIN + (x * extent) as u32,
                CANVAS - MARGIN - (y * extent) as u32,
            )
        })
        .collect();

    match points.as_slice() {
        [] => {}
        [only] => img.put_pixel(only.0, only.1, color),
        _ => {
            for pair in points.windows(2) {
                draw_line(img, pair[0], pair[1], color);
            }
        }
    }
}

/// White-to-purple shade for a normalized cell value
fn shade_purple(value: f32) -> Rgb<u8> {
    let v = value.clamp(0.0, 1.0);
    let lerp = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * v).round() as u8;
    Rgb([lerp(255, 84), lerp(255, 39), lerp(255, 143)])
}

fn plot_point(x: f32, y: f32) -> (u32, u32) {
    let extent = (CANVAS - 2 * MARGIN) as f32;
    let px = MARGIN + (x.clamp(0.0, 1.0) * extent) as u32;
    let py = CANVAS - MARGIN - (y.clamp(0.0, 1.0) * extent) as u32;
    (px.min(CANVAS - 1), py.min(CANVAS - 1))
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for yy in y..(y + h).min(img.height()) {
        for xx in x..(x + w).min(img.width()) {
            img.put_pixel(xx, yy, color);
        }
    }
}

fn draw_line(img: &mut RgbImage, from: (u32, u32), to: (u32, u32), color: Rgb<u8>) {
    let (mut x0, mut y0) = (from.0 as i64, from.1 as i64);
    let (x1, y1) = (to.0 as i64, to.1 as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x0 >= 0 && y0 >= 0 && (x0 as u32) < img.width() && (y0 as u32) < img.height() {
            img.put_pixel(x0 as u32, y0 as u32, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{roc_curve, ConfusionMatrix};

    #[test]
    fn test_confusion_matrix_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cm.png");

        let cm = ConfusionMatrix::from_predictions(&[0, 1, 1, 0], &[0, 1, 0, 0], 2);
        save_confusion_matrix(&cm, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.width(), 2 * CELL_SIZE + 2);
    }

    #[test]
    fn test_roc_curve_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roc.png");

        let roc = roc_curve(&[false, true, false, true], &[0.2, 0.9, 0.4, 0.7]).unwrap();
        save_roc_curve(&roc, &path).unwrap();

        assert!(path.exists());
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (CANVAS, CANVAS));
    }

    #[test]
    fn test_training_curves_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_plot.png");

        let history: Vec<EpochRecord> = (1..=5)
            .map(|epoch| EpochRecord {
                epoch,
                train_loss: 1.0 / epoch as f32,
                train_acc: 0.5 + 0.08 * epoch as f32,
                val_loss: 1.2 / epoch as f32,
                val_acc: 0.45 + 0.08 * epoch as f32,
            })
            .collect();
        save_training_curves(&history, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (2 * CANVAS, CANVAS));
        // Both panels carry curve pixels
        let has_color = |x0: u32, x1: u32| {
            (x0..x1).any(|x| (0..CANVAS).any(|y| *img.get_pixel(x, y) != Rgb([255, 255, 255])))
        };
        assert!(has_color(0, CANVAS));
        assert!(has_color(CANVAS, 2 * CANVAS));
    }

    #[test]
    fn test_training_curves_single_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_plot.png");

        let history = vec![EpochRecord {
            epoch: 1,
            train_loss: 0.7,
            train_acc: 0.6,
            val_loss: 0.8,
            val_acc: 0.55,
        }];
        save_training_curves(&history, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_shade_extremes() {
        assert_eq!(shade_purple(0.0), Rgb([255, 255, 255]));
        assert_eq!(shade_purple(1.0), Rgb([84, 39, 143]));
    }
}
