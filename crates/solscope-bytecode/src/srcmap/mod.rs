use solscope_core::SourceMapEntry;

/// Decodes a compiler source map (`s:l:f:j:m;...`) into absolute entries.
///
/// Empty fields inherit the previous entry's value; fields missing on the very
/// first entry resolve to `0:0:-1`. Only `s`, `l` and `f` are kept. An empty
/// input yields an empty list.
pub fn parse_src_mapping(srcmap: &str) -> Vec<SourceMapEntry> {
    if srcmap.is_empty() {
        return Vec::new();
    }

    let mut last = SourceMapEntry { start: 0, length: 0, file_index: -1 };
    let mut entries = Vec::new();

    for raw in srcmap.split(';') {
        let mut fields = raw.split(':');
        let start = fields.next().and_then(parse_field::<usize>).unwrap_or(last.start);
        let length = fields.next().and_then(parse_field::<usize>).unwrap_or(last.length);
        let file_index = fields.next().and_then(parse_field::<i64>).unwrap_or(last.file_index);

        last = SourceMapEntry { start, length, file_index };
        entries.push(last);
    }

    entries
}

fn parse_field<T: std::str::FromStr>(field: &str) -> Option<T> {
    if field.is_empty() {
        return None;
    }
    field.parse().ok()
}
