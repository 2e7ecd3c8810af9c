use super::*;

fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_new_rejects_zero_size() {
    assert!(TextChunker::new(0, 0).is_err());
}

#[test]
fn test_new_rejects_overlap_not_smaller_than_size() {
    let err = TextChunker::new(100, 100).unwrap_err();
    assert!(err.to_string().contains("overlap"));
}

#[test]
fn test_default_sizes() {
    let chunker = TextChunker::default();
    assert_eq!(chunker.chunk_size(), 1000);
    assert_eq!(chunker.chunk_overlap(), 200);
}

#[test]
fn test_from_config() {
    let config = IndexingConfig {
        chunk_size: 300,
        chunk_overlap: 30,
        ..IndexingConfig::default()
    };
    let chunker = TextChunker::from_config(&config).unwrap();
    assert_eq!(chunker.chunk_size(), 300);
    assert_eq!(chunker.chunk_overlap(), 30);
}

#[test]
fn test_empty_text_yields_no_chunks() {
    let chunker = TextChunker::default();
    assert!(chunker.split("").is_empty());
}

#[test]
fn test_whitespace_only_text_yields_no_chunks() {
    let chunker = TextChunker::default();
    assert!(chunker.split("   \n\n  \t\n ").is_empty());
}

#[test]
fn test_small_text_is_single_chunk() {
    let chunker = TextChunker::default();
    assert_eq!(chunker.split("def f(): pass"), vec!["def f(): pass"]);
}

#[test]
fn test_chunks_respect_max_length() {
    let chunker = TextChunker::default();
    let text = numbered_words(2000);
    let chunks = chunker.split(&text);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 1000, "chunk too long: {}", chunk.len());
        assert!(!chunk.trim().is_empty());
    }
}

#[test]
fn test_consecutive_chunks_overlap() {
    let chunker = TextChunker::default();
    let text = numbered_words(2000);
    let chunks = chunker.split(&text);

    for pair in chunks.windows(2) {
        let head: String = pair[1].chars().take(20).collect();
        assert!(
            pair[0].contains(&head),
            "next chunk should start inside the previous one: {:?}",
            head
        );
    }
}

#[test]
fn test_chunks_cover_every_word() {
    let chunker = TextChunker::new(100, 20).unwrap();
    let text = numbered_words(300);
    let chunks = chunker.split(&text);
    let joined = chunks.join(" ");

    for i in 0..300 {
        let word = format!("w{}", i);
        assert!(
            joined.split_whitespace().any(|w| w == word),
            "missing {}",
            word
        );
    }
}

#[test]
fn test_prefers_paragraph_boundaries() {
    let chunker = TextChunker::default();
    let first = format!("{}alpha", "alpha ".repeat(99));
    let second = format!("{}beta", "beta ".repeat(119));
    let text = format!("{}\n\n{}", first, second);

    let chunks = chunker.split(&text);
    assert_eq!(chunks, vec![first, second]);
}

#[test]
fn test_prefers_line_boundaries_over_words() {
    let chunker = TextChunker::new(50, 0).unwrap();
    let text = "first line of code here\nsecond line of code here\nthird line";

    let chunks = chunker.split(text);
    assert_eq!(chunks[0], "first line of code here\nsecond line of code here");
    assert_eq!(chunks[1], "third line");
}

#[test]
fn test_unbroken_text_falls_back_to_characters() {
    let chunker = TextChunker::default();
    let text = "x".repeat(2500);
    let chunks = chunker.split(&text);

    assert!(chunks.len() >= 3);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 1000);
    }
}

#[test]
fn test_multibyte_text_counts_characters() {
    let chunker = TextChunker::default();
    let text = "한".repeat(1500);
    let chunks = chunker.split(&text);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].chars().count(), 1000);
}

#[test]
fn test_split_is_deterministic() {
    let chunker = TextChunker::new(120, 30).unwrap();
    let text = numbered_words(500);
    assert_eq!(chunker.split(&text), chunker.split(&text));
}

#[test]
fn test_split_keeping_separator_attaches_to_following_piece() {
    assert_eq!(
        split_keeping_separator("a\nb\nc", "\n"),
        vec!["a", "\nb", "\nc"]
    );
    assert_eq!(split_keeping_separator("\nb", "\n"), vec!["\nb"]);
    assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
}
