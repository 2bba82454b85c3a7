use std::path::Path;

use plotly::common::{Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::error::{Error, Result};
use crate::metrics::MetricsLog;

/// Writes an HTML chart of one combination's training history.
///
/// Losses share the left axis, validation accuracy uses the right one. The
/// epoch with the highest accuracy and the one with the lowest validation
/// loss are marked.
pub fn plot_stats<P: AsRef<Path>>(log: &MetricsLog, key: &str, path: P) -> Result<()> {
    let record = log
        .get(key)
        .filter(|record| !record.is_empty())
        .ok_or_else(|| Error::Dataset(format!("no metrics recorded for {}", key)))?;

    let epochs: Vec<usize> = record.keys().copied().collect();
    let training_loss: Vec<f32> = record.values().map(|m| m.training_loss).collect();
    let validation_loss: Vec<f32> = record.values().map(|m| m.validation_loss).collect();
    let accuracy: Vec<f32> = record.values().map(|m| m.validation_accuracy).collect();

    let (best_epoch, best) = record
        .iter()
        .fold(None, |best: Option<(usize, f32)>, (&epoch, m)| match best {
            Some((_, acc)) if acc >= m.validation_accuracy => best,
            _ => Some((epoch, m.validation_accuracy)),
        })
        .unwrap_or((1, 0.0));
    let (lowest_epoch, lowest) = record
        .iter()
        .fold(None, |low: Option<(usize, f32)>, (&epoch, m)| match low {
            Some((_, loss)) if loss <= m.validation_loss => low,
            _ => Some((epoch, m.validation_loss)),
        })
        .unwrap_or((1, 0.0));

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(epochs.clone(), training_loss)
            .mode(Mode::Lines)
            .name("training loss"),
    );
    plot.add_trace(
        Scatter::new(epochs.clone(), validation_loss)
            .mode(Mode::Lines)
            .name("validation loss"),
    );
    plot.add_trace(
        Scatter::new(epochs, accuracy)
            .mode(Mode::Lines)
            .name("validation accuracy")
            .y_axis("y2"),
    );
    plot.add_trace(
        Scatter::new(vec![lowest_epoch], vec![lowest])
            .mode(Mode::MarkersText)
            .text(&format!("{:.3} -LOWEST-", lowest))
            .name("lowest validation loss"),
    );
    plot.add_trace(
        Scatter::new(vec![best_epoch], vec![best])
            .mode(Mode::MarkersText)
            .text(&format!("{:.2} *BEST*", best))
            .name("best accuracy")
            .y_axis("y2"),
    );

    let layout = Layout::new()
        .title(Title::new(&format!("Digits Classifier Stats: {}", key)))
        .x_axis(Axis::new().title(Title::new("epochs")))
        .y_axis(Axis::new().title(Title::new("loss")))
        .y_axis2(
            Axis::new()
                .title(Title::new("accuracy (%)"))
                .overlaying("y")
                .side(plotly::common::AxisSide::Right),
        );
    plot.set_layout(layout);
    plot.write_html(path);

    Ok(())
}
