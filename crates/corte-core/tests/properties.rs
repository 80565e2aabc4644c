//! Property tests for the splitter and filename handling.

use std::collections::HashSet;

use corte_core::{CutRatio, Half, RasterPage, TextRun, dedupe_filenames, derive_filename, split_halves};
use corte_core::raster::belongs_to_top;
use proptest::prelude::*;

proptest! {
    #[test]
    fn halves_cover_the_page(height in 2u32..2000, width in 1u32..8, ratio in 0.01f64..0.99) {
        let page = RasterPage::blank(width, height);
        let ratio = CutRatio::new(ratio).unwrap();
        let (top, bottom) = split_halves(&page, ratio).unwrap();
        prop_assert_eq!(top.height + bottom.height, height);
        prop_assert!(top.height >= 1 && bottom.height >= 1);
        prop_assert_eq!(top.pixels.len() + bottom.pixels.len(), page.pixels.len());
        // Rounding moves the cut by at most one row (or the clamp on tiny pages).
        let expected = height as f64 * ratio.value();
        prop_assert!((top.height as f64 - expected).abs() <= 1.0 || height < 4);
    }

    #[test]
    fn run_at_midpoint_goes_to_top(height in 2u32..2000, ratio in 0.01f64..0.99) {
        let ratio = CutRatio::new(ratio).unwrap();
        let mid = ratio.split_row(height) as f64;
        let mut page = RasterPage::blank(1, height);
        page.runs = vec![TextRun::new("m", 0.0, mid)];
        let (top, bottom) = split_halves(&page, ratio).unwrap();
        prop_assert!(belongs_to_top(mid, mid));
        prop_assert_eq!(top.runs.len(), 1);
        prop_assert!(bottom.runs.is_empty());
    }

    #[test]
    fn every_run_lands_in_exactly_one_half(ys in proptest::collection::vec(0.0f64..500.0, 0..40)) {
        let mut page = RasterPage::blank(1, 500);
        page.runs = ys.iter().map(|&y| TextRun::new("r", 0.0, y)).collect();
        let (top, bottom) = split_halves(&page, CutRatio::default()).unwrap();
        prop_assert_eq!(top.runs.len() + bottom.runs.len(), ys.len());
        for run in &top.runs {
            prop_assert!(run.y <= 250.0);
        }
        for run in &bottom.runs {
            prop_assert!(run.y > 0.0);
        }
    }

    #[test]
    fn dedupe_never_repeats_a_path(names in proptest::collection::vec("[aAbB]{1,2}(_1)?\\.pdf", 0..30)) {
        let out = dedupe_filenames(&names);
        prop_assert_eq!(out.len(), names.len());
        let lowered: HashSet<String> = out.iter().map(|n| n.to_lowercase()).collect();
        prop_assert_eq!(lowered.len(), out.len());
    }

    #[test]
    fn derived_names_are_stable(conn in proptest::option::of("[0-9]{1,8}"), order in proptest::option::of("[0-9]{1,8}"), page in 0usize..500) {
        let a = derive_filename(None, conn.as_deref(), order.as_deref(), Half::Bottom, page);
        let b = derive_filename(None, conn.as_deref(), order.as_deref(), Half::Bottom, page);
        prop_assert_eq!(&a, &b);
        let lig = format!("LIG_{}_", conn.as_deref().unwrap_or("X"));
        prop_assert!(a.starts_with(&lig));
        let suffix = format!("_p{}_B.pdf", page + 1);
        prop_assert!(a.ends_with(&suffix));
    }
}
