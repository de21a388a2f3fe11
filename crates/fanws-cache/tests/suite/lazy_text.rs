use fanws_cache::LazyTextLoader;
use std::io::Write;

#[test]
fn lines_match_file_contents() {
    let expected: Vec<String> = (0..2_000)
        .map(|i| format!("line {i}: {}", "é".repeat(i % 7)))
        .collect();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in &expected {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();

    let loader = LazyTextLoader::with_chunk_size(file.path(), 128).unwrap();
    let lines: Vec<String> = loader.lines().unwrap().map(Result::unwrap).collect();
    assert_eq!(lines, expected);
    // Streaming lines does not populate the chunk cache.
    assert_eq!(loader.cached_bytes(), 0);
}

#[test]
fn chunks_cover_the_whole_file() {
    let contents: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&contents).unwrap();
    file.flush().unwrap();

    let loader = LazyTextLoader::with_chunk_size(file.path(), 4096).unwrap();
    assert_eq!(loader.chunk_count(), 3);

    let mut joined = Vec::new();
    for index in 0..loader.chunk_count() {
        joined.extend_from_slice(&loader.read_chunk(index).unwrap());
    }
    assert_eq!(joined, contents);
    assert_eq!(loader.cached_bytes(), contents.len() as u64);
}
