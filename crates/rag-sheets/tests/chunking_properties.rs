//! Property tests for chunk planning and token estimation

use proptest::prelude::*;
use rag_sheets::chunk::{plan_chunks, PlannedChunk};
use rag_sheets::{CharRatioEstimator, ChunkBudget, TokenEstimator, TokenStrategy};

fn assert_covers(plan: &[PlannedChunk], rows: usize) {
    let mut next = 0;
    for chunk in plan {
        assert_eq!(chunk.rows.start, next, "chunks are contiguous and ordered");
        assert!(!chunk.rows.is_empty(), "no empty chunks");
        next = chunk.rows.end;
    }
    assert_eq!(next, rows, "every row lands in a chunk");
}

proptest! {
    #[test]
    fn row_budget_fills_chunks(
        row_tokens in prop::collection::vec(0usize..200, 0..60),
        max_rows in 1usize..10,
    ) {
        let plan = plan_chunks(&row_tokens, &ChunkBudget::Rows(max_rows), |_| 0);
        assert_covers(&plan, row_tokens.len());

        if let Some((last, full)) = plan.split_last() {
            prop_assert!(last.rows.len() <= max_rows);
            for chunk in full {
                prop_assert_eq!(chunk.rows.len(), max_rows);
            }
        }
    }

    #[test]
    fn token_budget_respects_limit(
        row_tokens in prop::collection::vec(1usize..300, 0..60),
        overhead in 0usize..100,
        max in 50usize..1000,
    ) {
        let budget = ChunkBudget::Tokens { max, min: None, strategy: TokenStrategy::PreferMax };
        let plan = plan_chunks(&row_tokens, &budget, |_| overhead);
        assert_covers(&plan, row_tokens.len());

        for chunk in &plan {
            let sum: usize = row_tokens[chunk.rows.clone()].iter().sum();
            prop_assert_eq!(chunk.tokens, overhead + sum);
            // Only a lone row may exceed the budget
            if chunk.rows.len() > 1 {
                prop_assert!(chunk.tokens <= max);
            }
        }

        // Greedy: the next row would not have fit
        for pair in plan.windows(2) {
            let next_row = row_tokens[pair[1].rows.start];
            prop_assert!(pair[0].tokens + next_row > max);
        }
    }

    #[test]
    fn prefer_min_closes_at_minimum(
        row_tokens in prop::collection::vec(1usize..100, 0..60),
        overhead in 0usize..50,
        min in 50usize..300,
    ) {
        let max = min * 3;
        let budget = ChunkBudget::Tokens {
            max,
            min: Some(min),
            strategy: TokenStrategy::PreferMin,
        };
        let plan = plan_chunks(&row_tokens, &budget, |_| overhead);
        assert_covers(&plan, row_tokens.len());

        for chunk in &plan {
            if chunk.rows.len() > 1 {
                prop_assert!(chunk.tokens <= max);
                // Without its last row the chunk was still under the minimum
                let last = row_tokens[chunk.rows.end - 1];
                prop_assert!(chunk.tokens - last < min);
            }
        }
    }

    #[test]
    fn estimate_never_shrinks_when_text_grows(
        a in ".{0,80}",
        b in ".{0,80}",
        ratio in 0.5f64..10.0,
    ) {
        let estimator = CharRatioEstimator::new(ratio).unwrap();
        let joined = format!("{a}{b}");
        prop_assert!(estimator.estimate(&a) <= estimator.estimate(&joined));
        prop_assert!(estimator.estimate(&b) <= estimator.estimate(&joined));
    }
}
