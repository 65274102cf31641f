#[cfg(test)]
mod tests {
    use worker_pool::{
    errors::PoolError,
    model::PoolState,
    pool::{
        Config,
        WorkerPool,
        },
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<F, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    #[test]
    fn load_test_1_atomic_counter_stress() {
        println!("\n=== LOAD TEST 1: 10k пустых задач на 4 воркерах ===");
        let pool = WorkerPool::new(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        measure("10k tasks", || {
            for _ in 0..10_000 {
                let counter = counter.clone();
                pool.execute(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }).unwrap();
            }
            pool.shutdown();
        });

        assert_eq!(counter.load(Ordering::SeqCst), 10_000);
        let metrics = pool.metrics();
        assert_eq!(metrics.live_workers, 0, "все потоки должны завершиться");
        assert_eq!(metrics.completed_tasks, 10_000);
        assert_eq!(metrics.total_submitted, 10_000);
        assert_eq!(pool.state(), PoolState::Stopped);
    }

    #[test]
    fn load_test_2_many_producers_no_loss_no_duplicates() {
        println!("\n=== LOAD TEST 2: 8 продюсеров x 2k задач ===");
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 2_000;

        let pool = WorkerPool::with_config(Config::io_bound()).unwrap();
        let executions: Arc<Vec<AtomicUsize>> = Arc::new(
            (0..PRODUCERS * PER_PRODUCER).map(|_| AtomicUsize::new(0)).collect(),
        );

        let sum: usize = measure("16k tasks from 8 threads", || {
            thread::scope(|s| {
                let producers: Vec<_> = (0..PRODUCERS)
                    .map(|p| {
                        let pool = &pool;
                        let executions = executions.clone();
                        s.spawn(move || {
                            let handles: Vec<_> = (0..PER_PRODUCER)
                                .map(|i| {
                                    let id = p * PER_PRODUCER + i;
                                    let executions = executions.clone();
                                    pool.submit(move || {
                                        executions[id].fetch_add(1, Ordering::Relaxed);
                                        id
                                    }).unwrap()
                                })
                                .collect();
                            handles
                                .into_iter()
                                .map(|h| h.join().unwrap())
                                .sum::<usize>()
                        })
                    })
                    .collect();
                producers.into_iter().map(|h| h.join().unwrap()).sum::<usize>()
            })
        });

        let n = PRODUCERS * PER_PRODUCER;
        assert_eq!(sum, n * (n - 1) / 2);
        assert!(
            executions.iter().all(|c| c.load(Ordering::SeqCst) == 1),
            "каждая задача выполняется ровно один раз"
        );
    }

    #[test]
    fn load_test_3_blocked_workers_do_not_block_submitters() {
        println!("\n=== LOAD TEST 3: Очередь при занятых воркерах ===");
        let pool = WorkerPool::new(2).unwrap();
        let (gate_tx, gate_rx) = crossbeam::channel::unbounded::<()>();

        for _ in 0..2 {
            let gate_rx = gate_rx.clone();
            pool.execute(move || {
                gate_rx.recv().unwrap();
            }).unwrap();
        }

        let handles: Vec<_> = measure("1k submissions while workers are busy", || {
            (0..1_000)
                .map(|i| pool.submit(move || i).unwrap())
                .collect()
        });

        let metrics = pool.metrics();
        assert!(metrics.queued_tasks >= 1_000 && metrics.queued_tasks <= 1_002);
        assert!(metrics.queue_pressure() > 0.0);

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, (0..1_000).collect::<Vec<_>>());
    }

    #[test]
    fn load_test_4_submit_races_with_shutdown() {
        println!("\n=== LOAD TEST 4: Отправка во время остановки ===");
        let pool = WorkerPool::new(4).unwrap();
        let executed = Arc::new(AtomicUsize::new(0));

        let accepted: usize = thread::scope(|s| {
            let producers: Vec<_> = (0..4)
                .map(|_| {
                    let pool = &pool;
                    let executed = executed.clone();
                    s.spawn(move || {
                        let mut accepted = 0usize;
                        loop {
                            let executed = executed.clone();
                            match pool.execute(move || {
                                executed.fetch_add(1, Ordering::Relaxed);
                            }) {
                                Ok(()) => accepted += 1,
                                Err(PoolError::ShuttingDown) => break accepted,
                                Err(e) => panic!("неожиданная ошибка: {e}"),
                            }
                        }
                    })
                })
                .collect();

            thread::sleep(Duration::from_millis(20));
            pool.shutdown();
            producers.into_iter().map(|h| h.join().unwrap()).sum::<usize>()
        });

        assert!(accepted > 0);
        assert_eq!(executed.load(Ordering::SeqCst), accepted, "принятые задачи не теряются");
        assert_eq!(pool.metrics().total_submitted, accepted);
    }

    #[test]
    fn load_test_5_mixed_failures() {
        println!("\n=== LOAD TEST 5: Смешанные успехи и паники ===");
        let pool = WorkerPool::with_config(Config::cpu_bound()).unwrap();

        let handles: Vec<_> = (0..1_000)
            .map(|x| {
                pool.submit(move || {
                    if x % 10 == 0 {
                        panic!("Test panic");
                    }
                    x
                }).unwrap()
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(failed, 100);

        pool.wait_idle();
        let metrics = pool.metrics();
        println!("  Success rate: {:.1}%", metrics.success_rate() * 100.0);
        assert_eq!(metrics.failed_tasks, 100);
        assert_eq!(metrics.completed_tasks, 900);
        assert_eq!(metrics.live_workers, pool.num_threads());
    }
}
