use itertools::Itertools;
use std::time::SystemTime;

/// Floored median of integer samples. Even-sized inputs average the two middle values.
pub fn median(data: &[u32]) -> Option<u32> {
    let sorted = data.iter().copied().sorted_unstable().collect::<Vec<u32>>();

    match sorted.len() {
        0 => None,
        len if len % 2 == 1 => Some(sorted[len / 2]),
        len => {
            let lower = sorted[len / 2 - 1] as u64;
            let upper = sorted[len / 2] as u64;
            Some(((lower + upper) / 2) as u32)
        }
    }
}

/// Signed seconds from `earlier` to `later`; negative when the clock went backwards.
pub fn secs_between(earlier: SystemTime, later: SystemTime) -> f64 {
    match later.duration_since(earlier) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(skew) => -skew.duration().as_secs_f64(),
    }
}
