// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::assemble::AssemblyContext;
use crate::config::PageLimits;
use crate::error::EffectsError;
use crate::page::{Cursor, Order, PageSpec};
use crate::responder::effects_page;
use crate::scope::ScopeFilter;
use crate::tests::fixtures::{account, effect, FixtureStore, TestAssembler};
use crate::types::paging::PagingToken;

fn ctx() -> AssemblyContext {
    AssemblyContext::new("https://history.example.org/")
}

#[test]
fn test_account_page_single_ledger_fetch() {
    let store = FixtureStore::with(vec![
        effect(100, 1, 1, 1, 'A'),
        effect(100, 1, 1, 2, 'A'),
        effect(100, 2, 1, 1, 'B'),
        effect(101, 1, 1, 1, 'A'),
    ]);
    let assembler = TestAssembler::default();
    let spec = PageSpec::from_params(Some("429496729600"), Some("asc"), Some(2), &PageLimits::default()).unwrap();

    let scope = ScopeFilter::Account(account('A'));
    let page = effects_page(&store, &assembler, &ctx(), &scope, &spec, "429496729600").unwrap();

    assert_eq!(page.len(), 2);
    // Echoed exactly as sent, not normalized to `op-order`.
    assert_eq!(page.cursor, "429496729600");
    assert_eq!(page.limit, 2);
    assert_eq!(page.order, Order::Ascending);
    assert_eq!(store.ledger_calls.get(), 1);
    assert!(page.items.iter().all(|r| r.ledger == 100));
    assert!(page.items[0].token < page.items[1].token);
    assert!(page.items[0].link.starts_with("https://history.example.org/operations/"));
}

#[test]
fn test_links_follow_first_and_last_records() {
    let records = vec![effect(7, 1, 1, 1, 'A'), effect(7, 1, 1, 2, 'A'), effect(8, 1, 1, 1, 'A')];
    let store = FixtureStore::with(records.clone());
    let spec = PageSpec::new(Cursor::Start, Order::Ascending, 2, &PageLimits::default()).unwrap();

    let page = effects_page(&store, &TestAssembler::default(), &ctx(), &ScopeFilter::None, &spec, "").unwrap();

    assert_eq!(page.links.self_, spec);
    assert_eq!(page.links.next.cursor(), Cursor::After(records[1].paging_token));
    assert_eq!(page.links.next.order(), Order::Ascending);
    assert_eq!(page.links.prev.cursor(), Cursor::After(records[0].paging_token));
    assert_eq!(page.links.prev.order(), Order::Descending);
}

#[test]
fn test_empty_page_is_not_an_error() {
    let store = FixtureStore::with(vec![effect(7, 1, 1, 1, 'A')]);
    let cursor = Cursor::After(PagingToken::ledger_start(crate::types::id::LedgerSeq(9)));
    let spec = PageSpec::new(cursor, Order::Ascending, 5, &PageLimits::default()).unwrap();

    let page = effects_page(&store, &TestAssembler::default(), &ctx(), &ScopeFilter::None, &spec, "").unwrap();

    assert!(page.is_empty());
    assert_eq!(store.ledger_calls.get(), 0);
    assert_eq!(page.links.next, spec);
    assert_eq!(page.links.prev.cursor(), cursor);
}

#[test]
fn test_assembly_failure_aborts_page() {
    let records = vec![effect(7, 1, 1, 1, 'A'), effect(7, 1, 1, 2, 'A'), effect(7, 1, 1, 3, 'A')];
    let store = FixtureStore::with(records.clone());
    let assembler = TestAssembler {
        fail_on: Some(records[1].paging_token),
        ..Default::default()
    };
    let spec = PageSpec::new(Cursor::Start, Order::Ascending, 10, &PageLimits::default()).unwrap();

    match effects_page(&store, &assembler, &ctx(), &ScopeFilter::None, &spec, "") {
        Err(EffectsError::Assembly { paging_token, source }) => {
            assert_eq!(paging_token, records[1].paging_token);
            assert_eq!(source.to_string(), "refused by fixture");
        }
        other => panic!("Expected Assembly error, got {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_invalid_request_short_circuits_before_io() {
    let store = FixtureStore::with(vec![effect(7, 1, 1, 1, 'A')]);
    store.oldest.set(8);
    let cursor = Cursor::After(PagingToken::ledger_start(crate::types::id::LedgerSeq(7)));
    let spec = PageSpec::new(cursor, Order::Ascending, 5, &PageLimits::default()).unwrap();

    let err = effects_page(&store, &TestAssembler::default(), &ctx(), &ScopeFilter::None, &spec, "").unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(store.select_calls.get(), 0);
    assert_eq!(store.ledger_calls.get(), 0);
}
