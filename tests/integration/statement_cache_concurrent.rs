#![allow(missing_docs)]

use std::sync::{Arc, Barrier};
use std::thread;

use sqlset::render::{Node, StatementSource};
use sqlset::{params, BindingDescriptor, MappedStatement, ParameterMode, Result, Value};

const NUM_THREADS: usize = 8;
const CALLS_PER_THREAD: usize = 200;
const SHAPES: usize = 6;

fn search_statement(capacity: usize) -> MappedStatement {
    let source = StatementSource::new(
        Node::Composite(vec![
            Node::literal("SELECT * FROM ORDERS WHERE TENANT = ?"),
            Node::templated(" AND STATUS = :status"),
            Node::templated(" AND TOTAL > #{min_total}"),
        ]),
        vec![BindingDescriptor::builder("tenant").mode(ParameterMode::In).build()],
        Vec::new(),
    );
    MappedStatement::builder("search", source)
        .namespace("orders")
        .cache_capacity(capacity)
        .build()
}

fn shape_params(shape: usize, tenant: i64) -> (String, Value) {
    let with_status = shape % 2 == 0;
    let with_total = shape % 3 == 0;
    let key = format!("status={with_status},total={with_total}");
    let params = params! {
        "tenant" => tenant,
        "status" => with_status.then_some("OPEN"),
        "min_total" => with_total.then_some(100i64),
    };
    (key, params)
}

#[test]
fn concurrent_cached_renders_share_text_but_not_values() -> Result<()> {
    let stmt = Arc::new(search_statement(256));
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let mut handles = Vec::new();

    for thread_id in 0..NUM_THREADS {
        let stmt = Arc::clone(&stmt);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || -> Result<()> {
            barrier.wait();
            for i in 0..CALLS_PER_THREAD {
                let tenant = (thread_id * CALLS_PER_THREAD + i) as i64;
                let (key, params) = shape_params(i % SHAPES, tenant);
                let cached = stmt.render_cached(&params, None, Some(&key))?;
                let fresh = stmt.render(&params)?;
                assert_eq!(cached.sql(), fresh.sql());
                assert_eq!(cached.value_list(), fresh.value_list());
                assert_eq!(cached.values()[0].value, Value::Int(tenant));
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("render thread panicked")?;
    }

    let stats = stmt.cache_stats();
    let total = (NUM_THREADS * CALLS_PER_THREAD) as u64;
    assert_eq!(stats.hits + stats.misses, total);
    // distinct keys = distinct (status, total) combinations
    assert_eq!(stats.entries, 4);
    assert!(stats.misses >= 4);
    assert!(stats.hit_rate() > 0.5);
    Ok(())
}

#[test]
fn small_capacity_evicts_under_contention() -> Result<()> {
    let stmt = Arc::new(search_statement(2));
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|thread_id| {
            let stmt = Arc::clone(&stmt);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> Result<()> {
                barrier.wait();
                for i in 0..CALLS_PER_THREAD {
                    let (key, params) = shape_params((thread_id + i) % SHAPES, 1);
                    stmt.render_cached(&params, None, Some(&key))?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("render thread panicked")?;
    }

    let stats = stmt.cache_stats();
    assert!(stats.entries <= 2);
    assert!(stats.evictions > 0);
    assert_eq!(stats.inserts, stats.misses);
    Ok(())
}
