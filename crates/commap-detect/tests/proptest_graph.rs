use std::collections::HashSet;
use std::path::Path;

use commap_core::corpus::{Corpus, Message};
use commap_detect::graph::{GraphBuilder, IncrementWeighting, RescaleWeighting};
use commap_detect::pajek::{read_pajek, write_pajek};
use proptest::prelude::*;

const ADDRS: [&str; 8] = [
    "a@x.com", "b@x.com", "c@x.com", "d@x.com", "e@x.com", "f@x.com", "g@x.com", "h@x.com",
];

fn arb_message() -> impl Strategy<Value = Message> {
    (
        0..ADDRS.len(),
        prop::collection::vec(0..ADDRS.len(), 1..4),
        prop::option::of(prop::collection::vec(0..ADDRS.len(), 0..3)),
    )
        .prop_map(|(from, to, cc)| {
            let to: Vec<&str> = to.into_iter().map(|i| ADDRS[i]).collect();
            let cc: Option<Vec<&str>> = cc.map(|c| c.into_iter().map(|i| ADDRS[i]).collect());
            Message::new(ADDRS[from], &to, cc.as_deref())
        })
}

fn arb_corpus() -> impl Strategy<Value = Corpus> {
    prop::collection::vec(arb_message(), 0..40).prop_map(|messages| {
        messages
            .into_iter()
            .enumerate()
            .map(|(i, m)| (format!("m{i:04}"), m))
            .collect()
    })
}

fn arb_members() -> impl Strategy<Value = HashSet<String>> {
    prop::collection::hash_set(0..ADDRS.len(), 0..=ADDRS.len())
        .prop_map(|idx| idx.into_iter().map(|i| ADDRS[i].to_string()).collect())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn graph_stays_inside_member_set(corpus in arb_corpus(), members in arb_members()) {
        let graph = GraphBuilder::new(&members, &RescaleWeighting).build(&corpus);
        for author in graph.authors() {
            prop_assert!(members.contains(author), "{} is not a member", author);
        }
        for (from, to, weight) in graph.edges() {
            prop_assert!(members.contains(from) && members.contains(to));
            prop_assert!(weight > 0.0 && weight <= 1.0);
        }
    }

    #[test]
    fn increment_weight_counts_observations(corpus in arb_corpus()) {
        let members: HashSet<String> = ADDRS.iter().map(|a| (*a).to_string()).collect();
        let graph = GraphBuilder::new(&members, &IncrementWeighting).build(&corpus);
        for (from, to, weight) in graph.edges() {
            let observed = corpus
                .messages()
                .filter(|m| m.from == from && m.recipients().any(|r| r == to))
                .count();
            prop_assert!((weight - observed as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn pajek_round_trip_preserves_nodes_and_weights(corpus in arb_corpus(), members in arb_members()) {
        let graph = GraphBuilder::new(&members, &RescaleWeighting).build(&corpus);
        let mut buf = Vec::new();
        write_pajek(&graph, &mut buf).expect("write to vec");
        let parsed = read_pajek(buf.as_slice(), Path::new("prop.net")).expect("parse");

        let original: HashSet<&str> = graph.authors().collect();
        let reread: HashSet<&str> = parsed.authors().collect();
        prop_assert_eq!(original, reread);
        prop_assert_eq!(graph.edge_count(), parsed.edge_count());
        for (from, to, weight) in graph.edges() {
            let got = parsed.edge_weight(from, to);
            prop_assert!(got.is_some_and(|w| (w - weight).abs() <= 1e-12 * weight.abs().max(1.0)));
        }
    }
}
