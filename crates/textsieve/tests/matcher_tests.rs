// Matcher behavior tests: table rules, normalization classes, exemptions,
// redaction, and the construction-error contract.
use textsieve::{
    CombinePolicy, MaskPolicy, MatchKind, Matcher, MatcherDef, NormFlags, SieveError, TableDef,
    WordListDef,
};

fn list(list_id: u32, kind: MatchKind, normalization: NormFlags, words: &[&str]) -> WordListDef {
    WordListDef {
        list_id,
        kind,
        normalization,
        words: words.iter().map(|w| w.to_string()).collect(),
    }
}

fn table(table_id: u32, policy: CombinePolicy, word_lists: Vec<WordListDef>) -> TableDef {
    TableDef {
        match_id: format!("table-{table_id}"),
        table_id,
        policy,
        word_lists,
        exemption: None,
    }
}

fn matcher(tables: Vec<TableDef>) -> Matcher {
    Matcher::new(&MatcherDef {
        mask: MaskPolicy::default(),
        tables,
    })
    .expect("valid definition")
}

#[test]
fn plain_containment() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::empty(), &["hello"])],
    )]);

    assert!(m.is_match("say hello there"));
    assert!(!m.is_match("say goodbye"));
    assert_eq!(m.word_match("say hello there"), Some("hello"));
    assert_eq!(m.word_match("say goodbye"), None);
}

#[test]
fn is_match_agrees_with_word_match() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(
            1,
            MatchKind::Exact,
            NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
            &["secret", "hidden"],
        )],
    )]);

    for text in [
        "",
        "nothing here",
        "the secret",
        "the S-E-C-R-E-T",
        "hi dden", // elision joins the halves
        "hidde",
        "完全不相关",
    ] {
        assert_eq!(
            m.is_match(text),
            m.word_match(text).is_some(),
            "disagreement on {text:?}"
        );
    }
}

#[test]
fn repeated_queries_are_deterministic() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::CASE_FOLD, &["alpha", "beta"])],
    )]);

    let text = "Alpha and BETA and alpha again";
    let first = (m.is_match(text), m.word_match(text).map(str::to_string), m.process(text));
    for _ in 0..5 {
        let again = (m.is_match(text), m.word_match(text).map(str::to_string), m.process(text));
        assert_eq!(first, again);
    }
}

#[test]
fn separator_elision_vs_plain() {
    // The same word in two disciplines: the elision list must catch
    // spaced/punctuated variants, the plain list must not.
    let elided = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(
            1,
            MatchKind::Exact,
            NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
            &["word"],
        )],
    )]);
    let plain = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::empty(), &["word"])],
    )]);

    assert!(elided.is_match("w-o-r-d"));
    assert!(elided.is_match("W O R D"));
    assert!(elided.is_match("plain word too"));
    assert!(!plain.is_match("w-o-r-d"));
    assert!(!plain.is_match("W O R D"));
    assert!(plain.is_match("plain word too"));
}

#[test]
fn similar_character_folding() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(
            1,
            MatchKind::Exact,
            NormFlags::CASE_FOLD | NormFlags::FOLD_SIMILAR,
            &["password"],
        )],
    )]);

    assert!(m.is_match("p4ssw0rd"));
    assert!(m.is_match("ＰＡＳＳＷＯＲＤ"));
    assert!(m.is_match("pa$$word"));
    assert!(!m.is_match("passw")); // partial never matches
}

#[test]
fn transliteration_table() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(
            1,
            MatchKind::Exact,
            NormFlags::TRANSLITERATE,
            &["中国"],
        )],
    )]);

    assert!(m.is_match("来自中國的消息"));
    assert!(m.is_match("来自中国的消息"));
}

#[test]
fn and_table_requires_every_list() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::All,
        vec![
            list(1, MatchKind::Exact, NormFlags::CASE_FOLD, &["alpha"]),
            list(2, MatchKind::Exact, NormFlags::CASE_FOLD, &["beta"]),
        ],
    )]);

    assert!(m.is_match("alpha and beta together"));
    assert!(!m.is_match("alpha alone"));
    assert!(!m.is_match("beta alone"));
    assert!(!m.is_match("neither"));
}

#[test]
fn or_table_reports_lowest_list_id_first() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![
            list(2, MatchKind::Exact, NormFlags::empty(), &["late"]),
            list(1, MatchKind::Exact, NormFlags::empty(), &["early"]),
        ],
    )]);

    // Both lists hit; list 1 wins regardless of span position.
    assert_eq!(m.word_match("late then early"), Some("early"));
}

#[test]
fn exemption_overrides_match() {
    let mut t = table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::CASE_FOLD, &["hello"])],
    );
    t.exemption = Some(list(
        100,
        MatchKind::Exact,
        NormFlags::CASE_FOLD,
        &["world"],
    ));
    let m = matcher(vec![t]);

    assert!(m.is_match("hello"));
    assert!(!m.is_match("hello,world"));
    assert_eq!(m.word_match("hello world"), None);
    // The exemption never creates a match on its own.
    assert!(!m.is_match("world"));
}

#[test]
fn fuzzy_segments_against_threshold() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(
            1,
            MatchKind::Fuzzy { threshold: 0.6 },
            NormFlags::CASE_FOLD,
            &["dark&web&market"],
        )],
    )]);

    // 13 canonical chars total: dark(4) web(3) market(6).
    assert!(m.is_match("dark market stuff")); // 10/13
    assert!(!m.is_match("just the market")); // 6/13
    assert!(!m.is_match("dark alone")); // 4/13
    assert!(m.is_match("dark web market")); // 13/13
}

#[test]
fn fuzzy_full_threshold_requires_all_segments() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(
            1,
            MatchKind::Fuzzy { threshold: 1.0 },
            NormFlags::CASE_FOLD,
            &["hello&world"],
        )],
    )]);

    assert!(m.is_match("hello world"));
    assert!(m.is_match("worldly hello")); // order-free
    assert!(!m.is_match("hello"));
    assert_eq!(m.word_match("hello world"), Some("hello&world"));
}

#[test]
fn tables_evaluated_in_id_order() {
    let m = matcher(vec![
        table(
            2,
            CombinePolicy::Any,
            vec![list(1, MatchKind::Exact, NormFlags::empty(), &["both"])],
        ),
        table(
            1,
            CombinePolicy::Any,
            vec![list(1, MatchKind::Exact, NormFlags::empty(), &["both here"])],
        ),
    ]);

    // Both tables qualify; table 1 supplies the word.
    assert_eq!(m.word_match("both here"), Some("both here"));
}

#[test]
fn empty_text_never_matches() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::all(), &["anything"])],
    )]);

    assert!(!m.is_match(""));
    assert_eq!(m.word_match(""), None);
    assert_eq!(m.process(""), None);
    assert!(m.hits("").is_empty());
}

#[test]
fn empty_definition_fails_construction() {
    let err = Matcher::new(&MatcherDef {
        mask: MaskPolicy::default(),
        tables: vec![],
    })
    .unwrap_err();
    assert!(matches!(err, SieveError::EmptyPatternSet(_)));

    // A table whose every word normalizes away is just as empty.
    let err = Matcher::new(&MatcherDef {
        mask: MaskPolicy::default(),
        tables: vec![table(
            1,
            CombinePolicy::Any,
            vec![list(
                1,
                MatchKind::Exact,
                NormFlags::DELETE_SEPARATORS,
                &["...", "- -"],
            )],
        )],
    })
    .unwrap_err();
    assert!(matches!(err, SieveError::EmptyPatternSet(_)));
}

#[test]
fn and_table_with_unusable_list_fails_construction() {
    let err = Matcher::new(&MatcherDef {
        mask: MaskPolicy::default(),
        tables: vec![table(
            1,
            CombinePolicy::All,
            vec![
                list(1, MatchKind::Exact, NormFlags::empty(), &["fine"]),
                list(2, MatchKind::Exact, NormFlags::DELETE_SEPARATORS, &["!!!"]),
            ],
        )],
    })
    .unwrap_err();
    assert!(matches!(err, SieveError::Table(_)));

    let err = Matcher::new(&MatcherDef {
        mask: MaskPolicy::default(),
        tables: vec![table(1, CombinePolicy::All, vec![])],
    })
    .unwrap_err();
    assert!(matches!(err, SieveError::Table(_)));
}

#[test]
fn or_table_with_no_lists_never_matches() {
    // Legal as long as some other table supplies patterns.
    let m = matcher(vec![
        table(1, CombinePolicy::Any, vec![]),
        table(
            2,
            CombinePolicy::Any,
            vec![list(1, MatchKind::Exact, NormFlags::empty(), &["real"])],
        ),
    ]);
    assert!(m.is_match("real"));
    assert!(!m.is_match("unrelated"));
}

#[test]
fn process_masks_matched_spans() {
    let m = Matcher::new(&MatcherDef {
        mask: MaskPolicy::Replace("***".to_string()),
        tables: vec![table(
            1,
            CombinePolicy::Any,
            vec![list(
                1,
                MatchKind::Exact,
                NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
                &["secret"],
            )],
        )],
    })
    .unwrap();

    assert_eq!(
        m.process("the secret plan").as_deref(),
        Some("the *** plan")
    );
    // The obfuscated span is masked in full, separators included.
    assert_eq!(
        m.process("the S-E-C-R-E-T plan").as_deref(),
        Some("the *** plan")
    );
    assert_eq!(m.process("no match"), None);
}

#[test]
fn process_masks_all_tables_not_just_the_first() {
    let m = Matcher::new(&MatcherDef {
        mask: MaskPolicy::Replace("#".to_string()),
        tables: vec![
            table(
                1,
                CombinePolicy::Any,
                vec![list(1, MatchKind::Exact, NormFlags::empty(), &["aaa"])],
            ),
            table(
                2,
                CombinePolicy::Any,
                vec![list(1, MatchKind::Exact, NormFlags::empty(), &["zzz"])],
            ),
        ],
    })
    .unwrap();

    assert_eq!(m.process("aaa then zzz").as_deref(), Some("# then #"));
}

#[test]
fn process_resolves_overlaps_earliest_first() {
    let m = Matcher::new(&MatcherDef {
        mask: MaskPolicy::Replace("*".to_string()),
        tables: vec![table(
            1,
            CombinePolicy::Any,
            vec![list(1, MatchKind::Exact, NormFlags::empty(), &["abcd", "cdef"])],
        )],
    })
    .unwrap();

    // "cdef" overlaps the applied "abcd" replacement and is discarded.
    assert_eq!(m.process("abcdef").as_deref(), Some("*ef"));
}

#[test]
fn process_remove_policy_deletes_spans() {
    let m = Matcher::new(&MatcherDef {
        mask: MaskPolicy::Remove,
        tables: vec![table(
            1,
            CombinePolicy::Any,
            vec![list(1, MatchKind::Exact, NormFlags::CASE_FOLD, &["noise"])],
        )],
    })
    .unwrap();

    assert_eq!(m.process("some NOISE here").as_deref(), Some("some  here"));
}

#[test]
fn process_is_idempotent() {
    let m = Matcher::new(&MatcherDef {
        mask: MaskPolicy::Replace("***".to_string()),
        tables: vec![table(
            1,
            CombinePolicy::Any,
            vec![list(
                1,
                MatchKind::Exact,
                NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
                &["secret", "hidden"],
            )],
        )],
    })
    .unwrap();

    let masked = m.process("the secret and h i d d e n parts").unwrap();
    assert_eq!(m.process(&masked), None, "masked text re-matched");
}

#[test]
fn hits_report_original_text_offsets() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(
            1,
            MatchKind::Exact,
            NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
            &["secret"],
        )],
    )]);

    let text = "the S-E-C-R-E-T plan";
    let hits = m.hits(text);
    assert_eq!(hits.len(), 1);
    let hit = hits[0];
    assert_eq!(hit.word, "secret");
    assert_eq!(&text[hit.start..hit.end], "S-E-C-R-E-T");
    assert_eq!(hit.table_id, 1);
    assert_eq!(hit.list_id, 1);
    assert_eq!(hit.match_id, "table-1");
}

#[test]
fn blob_round_trip_builds_equivalent_matcher() {
    let def = MatcherDef {
        mask: MaskPolicy::default(),
        tables: vec![table(
            7,
            CombinePolicy::Any,
            vec![list(
                1,
                MatchKind::Exact,
                NormFlags::CASE_FOLD,
                &["roundtrip"],
            )],
        )],
    };
    let blob = textsieve::encode_matcher_def(&def);
    let m = Matcher::from_bytes(&blob).unwrap();
    assert!(m.is_match("RoundTrip"));
    assert!(Matcher::from_bytes(b"not msgpack at all").is_err());
}

#[test]
fn stats_count_queries() {
    let m = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::empty(), &["x"])],
    )]);

    assert!(m.is_match("x"));
    assert!(!m.is_match("y"));
    let _ = m.word_match("x");
    let stats = m.stats();
    assert_eq!(stats.total_queries, 3);
    assert_eq!(stats.queries_with_match, 2);
    assert_eq!(stats.queries_without_match, 1);
}

#[test]
fn cache_does_not_leak_across_instances() {
    let yes = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::empty(), &["shared"])],
    )]);
    let no = matcher(vec![table(
        1,
        CombinePolicy::Any,
        vec![list(1, MatchKind::Exact, NormFlags::empty(), &["different"])],
    )]);

    // Same text, interleaved, repeatedly: each instance must keep its own
    // cached answer.
    for _ in 0..3 {
        assert!(yes.is_match("shared text"));
        assert!(!no.is_match("shared text"));
    }
}
