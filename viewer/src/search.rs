use annotate::store::FunctionRecord;
use nucleo_matcher::{
    Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};

/// Fuzzy matches function names, best score first.
pub fn find_functions<'a>(functions: &'a [FunctionRecord], term: &str) -> Vec<&'a FunctionRecord> {
    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let pattern = Pattern::parse(term, CaseMatching::Ignore, Normalization::Smart);
    let mut buffer = vec![];
    let mut results: Vec<(usize, u32)> = functions
        .iter()
        .enumerate()
        .filter_map(|(i, function)| {
            let name32 = Utf32Str::new(&function.name, &mut buffer);
            Some((i, pattern.score(name32, &mut matcher)?))
        })
        .collect();
    results.sort_by_key(|(i, score)| (core::cmp::Reverse(*score), *i));
    results.into_iter().map(|(i, _)| &functions[i]).collect()
}
