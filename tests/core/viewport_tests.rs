//! Viewport windowing over a live history, exercised the way a render loop
//! drives it: zoom and pan between appends, then a draw pass through the
//! datasource trait.

use wattview::history::History;
use wattview::viewport::{GraphData, GraphSource, Viewport};

use crate::common::mock_profile;

fn ramp_history(count: usize) -> History {
    let mut history = History::new(count * 2);
    let values: Vec<i32> = (0..count as i32).collect();
    history.add(&mock_profile(0, &values));
    history
}

#[test]
fn test_window_stays_backed_while_data_streams_in() {
    let mut history = ramp_history(60);
    let mut viewport = Viewport::new();
    viewport.set_scale(3.0, &history);
    viewport.pan_by(1e9, &history);

    // pinned to the right edge: 20 visible of 60, offset 40
    assert_eq!(viewport.visible_count(&history), 20);
    assert_eq!(viewport.offset(), 40.0);

    // new data arrives; the offset holds still and the window, pinned at
    // the right edge, extends over the fresh samples
    history.add(&mock_profile(60, &[1000, 1001, 1002]));
    assert_eq!(viewport.offset(), 40.0);
    assert_eq!(viewport.visible_count(&history), 21);
    let last = viewport
        .sample(&history, viewport.visible_count(&history) - 1, 1)
        .unwrap();
    assert_eq!(last.value, Some(1000));
}

#[test]
fn test_zoom_out_from_right_edge_reclamps() {
    let history = ramp_history(60);
    let mut viewport = Viewport::new();
    viewport.set_scale(3.0, &history);
    viewport.pan_by(1e9, &history);

    // zooming back out grows the window past the data end; the offset has
    // to give way so the window stays fully backed
    viewport.set_scale(1.0, &history);
    assert_eq!(viewport.offset(), 0.0);
    assert_eq!(viewport.visible_count(&history), 60);
}

#[test]
fn test_draw_pass_with_block_averaging() {
    let history = ramp_history(100);
    let mut viewport = Viewport::new();
    viewport.set_scale(2.0, &history);

    let graph = GraphData {
        viewport: &viewport,
        history: &history,
    };

    // one column per 5 underlying seconds
    let block = 5;
    let columns = graph.sample_count() / block;
    assert_eq!(columns, 10);
    for column in 0..columns {
        let sample = graph.sample(column * block, block).unwrap();
        // mean of 5 consecutive ramp values: first + 2
        let expected = (25 + column * block + 2) as i32;
        assert_eq!(sample.value, Some(expected));
    }
}

#[test]
fn test_gap_survives_resampled_draw_pass() {
    let mut history = History::new(100);
    history.add(&mock_profile(0, &[10, 20]));
    history.add(&mock_profile(10, &[30])); // 8-second hole

    let viewport = Viewport::new();
    let graph = GraphData {
        viewport: &viewport,
        history: &history,
    };

    // a column made only of gap slots must render as unknown, not zero
    let hole = graph.sample(3, 4).unwrap();
    assert_eq!(hole.value, None);

    // a column straddling the gap averages only the present values
    let edge = graph.sample(0, 4).unwrap();
    assert_eq!(edge.value, Some(15));
}

#[test]
fn test_max_y_reported_through_datasource() {
    let history = ramp_history(10);
    let mut viewport = Viewport::new();
    viewport.set_max_y(750.0);

    let graph = GraphData {
        viewport: &viewport,
        history: &history,
    };
    assert_eq!(graph.max_y(), 750.0);
}
