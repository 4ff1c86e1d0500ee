// crates/matcher-core/tests/book_scenarios.rs

use matcher_core::{
    BookError, BookEvent, BookState, CancelError, DoneReason, EngineState, Order, OrderBook, Side,
};

fn order(id: &str, sender: &str, side: Side, price: u64, size: u64) -> Order {
    Order::new(id, sender, side, price, size, 0)
}

#[test]
fn resting_bid_emits_single_add() {
    let mut book = OrderBook::new("TESTUSD");

    let events = book.add(order("A", "u1", Side::Buy, 100, 10)).unwrap();

    assert_eq!(events.len(), 1);
    match &events[0] {
        BookEvent::Add { order } => {
            assert_eq!(order.id, "A");
            assert_eq!(order.size, 10);
            assert!(!order.done);
        }
        other => panic!("expected Add, got {other:?}"),
    }
    assert_eq!(book.best_bid(), Some(100));
    assert_eq!(book.best_ask(), None);
    assert!(book.contains("A"));
}

#[test]
fn partial_fill_leaves_provider_resting() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 10)).unwrap();

    let events = book.add(order("B", "u2", Side::Sell, 100, 4)).unwrap();

    // One match, then the fully filled taker leaves; no Add for B.
    assert_eq!(events.len(), 2);
    match &events[0] {
        BookEvent::Match {
            size,
            price,
            taker,
            provider,
        } => {
            assert_eq!(*size, 4);
            assert_eq!(*price, 100);
            assert_eq!(taker.id, "B");
            assert!(taker.done);
            assert_eq!(provider.id, "A");
            assert!(!provider.done);
            assert_eq!(provider.size, 6);
        }
        other => panic!("expected Match, got {other:?}"),
    }
    match &events[1] {
        BookEvent::Remove { order, reason } => {
            assert_eq!(order.id, "B");
            assert_eq!(*reason, DoneReason::Filled);
            assert_eq!(order.size, 0);
        }
        other => panic!("expected Remove, got {other:?}"),
    }

    let state = book.state();
    assert_eq!(state.bids.len(), 1);
    assert_eq!(state.bids[0].id, "A");
    assert_eq!(state.bids[0].size, 6);
    assert!(state.asks.is_empty());
}

#[test]
fn cancel_removes_residual() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 10)).unwrap();
    book.add(order("B", "u2", Side::Sell, 100, 4)).unwrap();

    let event = book.remove("A", "u1").unwrap();
    match event {
        BookEvent::Remove { order, reason } => {
            assert_eq!(order.id, "A");
            assert_eq!(order.size, 6);
            assert_eq!(order.price, 100);
            assert!(order.done);
            assert_eq!(reason, DoneReason::Cancelled);
        }
        other => panic!("expected Remove, got {other:?}"),
    }
    assert!(book.is_empty());
    assert_eq!(book.best_bid(), None);
}

#[test]
fn cancel_by_wrong_owner_is_rejected_without_mutation() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 10)).unwrap();

    assert_eq!(book.remove("A", "u2"), Err(CancelError::NotOwner));

    // Book untouched: the order is still live and still cancellable.
    assert!(book.contains("A"));
    assert_eq!(book.state().bids[0].size, 10);
    assert!(book.remove("A", "u1").is_ok());
}

#[test]
fn cancel_of_unknown_id_is_not_found() {
    let mut book = OrderBook::new("TESTUSD");
    assert_eq!(book.remove("missing", "u1"), Err(CancelError::NotFound));
}

#[test]
fn same_price_matches_in_arrival_order() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 5)).unwrap();
    book.add(order("B", "u2", Side::Buy, 100, 5)).unwrap();

    let events = book.add(order("C", "u3", Side::Sell, 100, 7)).unwrap();

    let matches: Vec<(&str, u64)> = events
        .iter()
        .filter_map(|e| match e {
            BookEvent::Match { provider, size, .. } => Some((provider.id.as_str(), *size)),
            _ => None,
        })
        .collect();
    assert_eq!(matches, vec![("A", 5), ("B", 2)]);

    // C is done, B rests with its residual.
    assert!(!book.contains("C"));
    let state = book.state();
    assert_eq!(state.bids.len(), 1);
    assert_eq!(state.bids[0].id, "B");
    assert_eq!(state.bids[0].size, 3);
}

#[test]
fn taker_sweeps_multiple_levels_at_provider_prices() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 101, 5)).unwrap();
    book.add(order("B", "u2", Side::Buy, 100, 5)).unwrap();

    let events = book.add(order("C", "u3", Side::Sell, 99, 12)).unwrap();

    // Best bid first, each trade at the provider's price.
    let matches: Vec<(u64, u64)> = events
        .iter()
        .filter_map(|e| match e {
            BookEvent::Match { price, size, .. } => Some((*price, *size)),
            _ => None,
        })
        .collect();
    assert_eq!(matches, vec![(101, 5), (100, 5)]);

    // Residual 2 rests on the sell side; bids are swept.
    match events.last().unwrap() {
        BookEvent::Add { order } => {
            assert_eq!(order.id, "C");
            assert_eq!(order.size, 2);
        }
        other => panic!("expected terminal Add, got {other:?}"),
    }
    assert_eq!(book.best_bid(), None);
    assert_eq!(book.best_ask(), Some(99));
}

#[test]
fn full_fill_on_arrival_emits_no_add() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Sell, 100, 10)).unwrap();

    let events = book.add(order("B", "u2", Side::Buy, 100, 10)).unwrap();

    assert!(matches!(events[0], BookEvent::Match { size: 10, .. }));
    // Provider removal precedes the taker's.
    match (&events[1], &events[2]) {
        (
            BookEvent::Remove {
                order: first,
                reason: DoneReason::Filled,
            },
            BookEvent::Remove {
                order: second,
                reason: DoneReason::Filled,
            },
        ) => {
            assert_eq!(first.id, "A");
            assert_eq!(second.id, "B");
        }
        other => panic!("expected two Remove events, got {other:?}"),
    }
    assert!(!events.iter().any(|e| matches!(e, BookEvent::Add { .. })));
    assert!(book.is_empty());
}

#[test]
fn book_is_never_crossed_at_rest() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 5)).unwrap();
    book.add(order("B", "u2", Side::Sell, 105, 5)).unwrap();
    book.add(order("C", "u3", Side::Buy, 103, 2)).unwrap();
    book.add(order("D", "u4", Side::Sell, 101, 1)).unwrap();

    let (bid, ask) = (book.best_bid().unwrap(), book.best_ask().unwrap());
    assert!(bid < ask, "crossed book at rest: bid {bid} >= ask {ask}");
}

#[test]
fn matched_size_equals_filled_order_flow() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 5)).unwrap();
    book.add(order("B", "u2", Side::Buy, 99, 7)).unwrap();
    let mut events = book.add(order("C", "u3", Side::Sell, 99, 9)).unwrap();
    events.extend(book.add(order("D", "u4", Side::Sell, 99, 3)).unwrap());

    let matched: u64 = events
        .iter()
        .filter_map(|e| match e {
            BookEvent::Match { size, .. } => Some(*size),
            _ => None,
        })
        .sum();

    // C sells 9: 5 vs A at 100, then 4 vs B at 99. D sells 3: 3 vs B.
    assert_eq!(matched, 12);

    // Every order that left the book via fills did so with a zero residual,
    // and each trade retired quantity from both parties.
    let filled_ids: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            BookEvent::Remove {
                order,
                reason: DoneReason::Filled,
            } => {
                assert_eq!(order.size, 0);
                Some(order.id.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(filled_ids, vec!["A", "C", "B", "D"]);
    let initial_filled_flow: u64 = 5 + 9 + 7 + 3;
    assert_eq!(matched * 2, initial_filled_flow);
}

#[test]
fn duplicate_id_is_a_precondition_breach() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 10)).unwrap();

    let err = book.add(order("A", "u1", Side::Buy, 101, 5)).unwrap_err();
    assert_eq!(err, BookError::DuplicateId("A".to_string()));
}

#[test]
fn zero_price_and_zero_size_are_rejected() {
    let mut book = OrderBook::new("TESTUSD");
    assert_eq!(
        book.add(order("A", "u1", Side::Buy, 0, 10)),
        Err(BookError::BadPrice)
    );
    assert_eq!(
        book.add(order("A", "u1", Side::Buy, 100, 0)),
        Err(BookError::BadSize)
    );
    assert!(book.is_empty());
}

#[test]
fn restored_book_behaves_identically() {
    let mut original = OrderBook::new("TESTUSD");
    original.add(order("A", "u1", Side::Buy, 100, 5)).unwrap();
    original.add(order("B", "u2", Side::Buy, 100, 3)).unwrap();
    original.add(order("C", "u3", Side::Sell, 102, 4)).unwrap();

    let mut restored = OrderBook::new("TESTUSD");
    restored.restore(original.state());
    assert_eq!(restored.state(), original.state());

    // The same input produces byte-identical events and state on both.
    let probe = order("D", "u4", Side::Sell, 100, 6);
    let a = original.add(probe.clone()).unwrap();
    let b = restored.add(probe).unwrap();
    assert_eq!(a, b);
    assert_eq!(restored.state(), original.state());
}

#[test]
fn engine_state_round_trips_through_json() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("A", "u1", Side::Buy, 100, 5)).unwrap();
    book.add(order("C", "u3", Side::Sell, 102, 4)).unwrap();

    let state = EngineState::new(3, 17, book.state());
    let body = serde_json::to_string(&state).unwrap();
    let loaded: EngineState = serde_json::from_str(&body).unwrap();
    assert_eq!(loaded, state);

    let mut rebuilt = OrderBook::new("TESTUSD");
    rebuilt.restore(loaded.into_book_state());
    assert_eq!(rebuilt.state(), book.state());
}

#[test]
fn state_lists_sides_in_priority_order() {
    let mut book = OrderBook::new("TESTUSD");
    book.add(order("B1", "u1", Side::Buy, 99, 1)).unwrap();
    book.add(order("B2", "u1", Side::Buy, 101, 1)).unwrap();
    book.add(order("B3", "u1", Side::Buy, 100, 1)).unwrap();
    book.add(order("A1", "u2", Side::Sell, 104, 1)).unwrap();
    book.add(order("A2", "u2", Side::Sell, 102, 1)).unwrap();

    let state: BookState = book.state();
    let bid_prices: Vec<u64> = state.bids.iter().map(|o| o.price).collect();
    let ask_prices: Vec<u64> = state.asks.iter().map(|o| o.price).collect();
    assert_eq!(bid_prices, vec![101, 100, 99]);
    assert_eq!(ask_prices, vec![102, 104]);
}
