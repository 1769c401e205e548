use std::collections::{BTreeSet, HashSet};

use invidex::index::{id_set, IndexMode};
use invidex::indexer::from_pairs;
use invidex::{
    IndexSettings, Indexer, IndexerConfig, InvertedIndex, SharedIndex, Tokenizer, TokenizerConfig,
};

const SCENARIO: [(&str, &str); 4] = [
    ("doc1", "Rector SPBU announced new rules"),
    ("doc2", "At MSU a rector meeting took place"),
    ("doc3", "SPBU and MSU cooperate in science"),
    ("doc4", "Rector SPBU met with rector MSU"),
];

const WORDS: [&str; 12] = [
    "rector", "SPBU", "MSU", "science", "rules", "meeting", "campus", "library", "student",
    "lecture", "2024", "3.14",
];

/// Deterministic pseudo-random corpus; document `i` draws words by an LCG
fn corpus(size: usize) -> Vec<(String, String)> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..size)
        .map(|i| {
            let len = 3 + i % 6;
            let words: Vec<&str> = (0..len)
                .map(|_| {
                    state = state
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    WORDS[(state >> 33) as usize % WORDS.len()]
                })
                .collect();
            (format!("page-{}", i), words.join(" "))
        })
        .collect()
}

fn build(docs: &[(String, String)], settings: IndexSettings) -> InvertedIndex {
    let mut index = InvertedIndex::new(settings);
    for (id, text) in docs {
        index.add_document(id, text).unwrap();
    }
    index
}

/// Documents whose token set holds every query token, by brute force
fn expected(docs: &[(String, String)], query: &str) -> BTreeSet<String> {
    let tokenizer = Tokenizer::new(&TokenizerConfig::default());
    let wanted = tokenizer.unique_terms(query);
    if wanted.is_empty() {
        return BTreeSet::new();
    }
    docs.iter()
        .filter(|(_, text)| {
            let tokens: HashSet<String> = tokenizer.tokenize(text).into_iter().collect();
            wanted.iter().all(|t| tokens.contains(t))
        })
        .map(|(id, _)| id.clone())
        .collect()
}

fn found(index: &InvertedIndex, query: &str) -> BTreeSet<String> {
    index.search(query).unwrap().into_iter().collect()
}

#[test]
fn scenario_before_and_after_compression() {
    let mut indexer = Indexer::new(IndexSettings::uncompressed(), IndexerConfig::default());
    indexer.process(from_pairs(SCENARIO)).unwrap();
    let raw = indexer.into_index();
    assert_eq!(raw.mode(), IndexMode::Raw);
    assert_eq!(
        id_set(&raw.search("Rector SPBU").unwrap()),
        HashSet::from(["doc1", "doc4"])
    );

    let mut indexer = Indexer::new(IndexSettings::default(), IndexerConfig::default());
    indexer.process(from_pairs(SCENARIO)).unwrap();
    let compressed = indexer.into_index();
    assert_eq!(compressed.mode(), IndexMode::Compressed);
    assert_eq!(
        id_set(&compressed.search("Rector SPBU").unwrap()),
        HashSet::from(["doc1", "doc4"])
    );
}

#[test]
fn conjunctive_search_matches_brute_force() {
    let docs = corpus(400);
    let mut index = build(&docs, IndexSettings::default());

    let queries = [
        "rector",
        "rector SPBU",
        "SPBU MSU science",
        "campus library student lecture",
        "2024 3.14",
        "rector rector",
        "unknown",
        "rector unknown",
        "",
        "   ",
    ];

    for query in queries {
        assert_eq!(found(&index, query), expected(&docs, query), "raw: {:?}", query);
    }

    index.compress().unwrap();
    for query in queries {
        assert_eq!(
            found(&index, query),
            expected(&docs, query),
            "compressed: {:?}",
            query
        );
    }
}

#[test]
fn empty_query_returns_nothing() {
    let index = build(&corpus(20), IndexSettings::default());
    assert!(index.search("").unwrap().is_empty());
    assert!(index.search("!!! ...").unwrap().is_empty());
}

#[test]
fn ingestion_is_idempotent() {
    let mut once = InvertedIndex::default();
    once.add_document("doc1", "Rector SPBU announced").unwrap();

    let mut twice = InvertedIndex::default();
    twice.add_document("doc1", "Rector SPBU announced").unwrap();
    assert!(!twice.add_document("doc1", "completely different words").unwrap());

    assert_eq!(once.len(), twice.len());
    assert_eq!(once.stats(), twice.stats());
    assert!(twice.search("different").unwrap().is_empty());
    assert_eq!(twice.search("Rector").unwrap(), vec!["doc1".to_string()]);
}

#[test]
fn lowercase_tokenizer_matches_any_casing() {
    let settings = IndexSettings {
        tokenizer_config: TokenizerConfig { lowercase: true },
        ..IndexSettings::default()
    };
    let mut indexer = Indexer::new(settings, IndexerConfig::default());
    indexer.process(from_pairs(SCENARIO)).unwrap();

    assert_eq!(
        id_set(&indexer.search("rector msu").unwrap()),
        HashSet::from(["doc2", "doc4"])
    );
}

#[test]
fn shared_index_serves_concurrent_readers() {
    let shared = SharedIndex::new(build(&corpus(200), IndexSettings::default()));
    shared.compress().unwrap();

    let expected_hits = shared.search("rector SPBU").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            std::thread::spawn(move || shared.search("rector SPBU").unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected_hits);
    }
}
