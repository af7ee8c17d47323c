use crate::data::ChunkPlan;
use crate::error::PlanningError;

/// Partition `size` bytes into `thread_count` contiguous chunk plans.
///
/// Every chunk gets `size / thread_count` bytes and the last one is pinned to
/// `size`, absorbing the remainder. Ids start at 1.
///
/// # Errors
///
/// [`PlanningError::ZeroThreads`] if `thread_count` is 0 and
/// [`PlanningError::EmptyResource`] if `size` is 0.
///
/// # Examples
///
/// ```
/// use splitfetch::plan_chunks;
///
/// let plans = plan_chunks(10, 3).unwrap();
/// let spans: Vec<_> = plans.iter().map(|p| (p.offset_from, p.offset_to)).collect();
/// assert_eq!(spans, vec![(0, 3), (3, 6), (6, 10)]);
/// ```
pub fn plan_chunks(size: u64, thread_count: u32) -> Result<Vec<ChunkPlan>, PlanningError> {
    if thread_count == 0 {
        return Err(PlanningError::ZeroThreads);
    }
    if size == 0 {
        return Err(PlanningError::EmptyResource);
    }

    let chunk_size = size / u64::from(thread_count);
    let mut plans = Vec::with_capacity(thread_count as usize);
    let mut offset = 0;

    for id in 1..=thread_count {
        let offset_to = if id == thread_count {
            size
        } else {
            offset + chunk_size
        };
        plans.push(ChunkPlan::new(id, offset, offset_to));
        offset = offset_to;
    }

    Ok(plans)
}
