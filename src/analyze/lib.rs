//! Contains the [spawn_analysis] function that spawns the analysis thread for either data validation or view generation.
use super::cycle::CycleAnalyzer;
use crate::util::*;

/// Analysis thread that performs checks with the [CycleAnalyzer] or generates views with the [super::view::lib::generate_view] function.
pub fn spawn_analysis<C: Config + 'static>(
    config: &'static C,
    stop_flag: Arc<AtomicBool>,
    stats_send: flume::Sender<StatType>,
    data_recv: crossbeam_channel::Receiver<Vec<Cycle>>,
) -> Result<JoinHandle<()>, io::Error> {
    let analysis_thread = thread::Builder::new().name("Analysis".to_string());
    analysis_thread.spawn({
        move || {
            // Setup for check case
            let mut analyzer = config
                .check()
                .is_some()
                .then(|| CycleAnalyzer::new(config, stats_send.clone()));
            // Start analysis
            while !stop_flag.load(Ordering::SeqCst) {
                // Receive batch from reader
                let cycle_batch = match data_recv.recv() {
                    Ok(cycles) => cycles,
                    Err(e) => {
                        debug_assert_eq!(e, crossbeam_channel::RecvError);
                        break;
                    }
                };

                // Do checks or view
                if let Some(analyzer) = analyzer.as_mut() {
                    for cycle in &cycle_batch {
                        if stop_flag.load(Ordering::SeqCst) {
                            break;
                        }
                        analyzer.analyze_cycle(cycle);
                    }
                } else {
                    if let Some(view) = config.view() {
                        if let Err(e) = super::view::lib::generate_view(
                            view,
                            &cycle_batch,
                            config.disable_styled_views(),
                        ) {
                            stats_send
                                .send(StatType::Fatal(e.to_string().into()))
                                .expect("Couldn't send to Controller");
                            break;
                        }
                    }
                    for cycle in &cycle_batch {
                        stats_send
                            .send(StatType::CycleSeen(CycleStats::scanned(cycle.frames.len())))
                            .expect("Couldn't send to Controller");
                    }
                }
            }
            if let Some(analyzer) = analyzer {
                let _ = analyzer.finish();
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::vfat_frame::VfatFrameBuilder;
    use pretty_assertions::assert_eq;

    static CONFIG_CHECK_ALL: OnceLock<MockConfig> = OnceLock::new();
    static CONFIG_NO_COMMAND: OnceLock<MockConfig> = OnceLock::new();

    fn test_cycle(id: u32) -> Cycle {
        Cycle {
            id,
            mem_pos: 0x8,
            frames: (0..3)
                .map(|i| FrameRecord {
                    position: FramePosition::new(1, 2, 0, 0, i),
                    frame: VfatFrameBuilder::new().ec(1).bc(2).build(),
                    mem_pos: 0x10 + u64::from(i) * 0x20,
                })
                .collect(),
        }
    }

    fn run_analysis(config: &'static MockConfig, batches: Vec<Vec<Cycle>>) -> Vec<StatType> {
        let (stats_send, stats_recv) = flume::unbounded();
        let (data_send, data_recv) = crossbeam_channel::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let handle = spawn_analysis(config, stop_flag, stats_send, data_recv).unwrap();
        for batch in batches {
            data_send.send(batch).unwrap();
        }
        drop(data_send);
        handle.join().unwrap();
        stats_recv.try_iter().collect()
    }

    #[test]
    fn check_all_sends_cycle_stats_and_summary() {
        let config = CONFIG_CHECK_ALL.get_or_init(MockConfig::new_check_all);
        let stats = run_analysis(config, vec![vec![test_cycle(0), test_cycle(1)], vec![test_cycle(2)]]);

        let cycles_seen = stats
            .iter()
            .filter(|s| matches!(s, StatType::CycleSeen(_)))
            .count();
        assert_eq!(cycles_seen, 3);
        assert!(matches!(stats.last(), Some(StatType::PositionSummary(summary)) if summary.positions_seen == 3));
    }

    #[test]
    fn no_command_only_counts_cycles() {
        let config = CONFIG_NO_COMMAND.get_or_init(MockConfig::new);
        let stats = run_analysis(config, vec![vec![test_cycle(0)]]);

        assert_eq!(stats, vec![StatType::CycleSeen(CycleStats::scanned(3))]);
    }
}
