#![no_main]

use libfuzzer_sys::fuzz_target;
use splitviz_stats::sampler;

fuzz_target!(|input: (Vec<f64>, u16)| {
    let (proportions, n) = input;
    if proportions.len() > 64 {
        return;
    }
    let n = u32::from(n);
    let counts = sampler::allocate(&proportions, n);

    assert_eq!(counts.len(), proportions.len());
    if !proportions.is_empty() {
        assert_eq!(counts.iter().sum::<u32>(), n, "allocation must sum to N");
    }
});
