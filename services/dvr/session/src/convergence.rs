//! Multi-node runs against an in-process relay.

use crate::channel::PacketChannel;
use crate::error::SessionError;
use crate::handler::{HandlerConfig, ProtocolHandler, SessionEnd, SessionOutcome};
use crate::memory::MemoryChannel;
use dvr_wire::{Cost, NodeId, Packet, PacketType, INFINITY, RELAY_NODE_ID};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const INF: Cost = INFINITY;

/// Square topology with one expensive diagonal:
/// 0-1 cost 1, 1-2 cost 2, 2-3 cost 1, 0-3 cost 7
fn square_topology() -> Vec<Vec<Cost>> {
    vec![
        vec![0, 1, INF, 7],
        vec![1, 0, 2, INF],
        vec![INF, 2, 0, 1],
        vec![7, INF, 1, 0],
    ]
}

struct SimulatedRelay {
    outboxes: Vec<mpsc::UnboundedSender<Packet>>,
    nodes: Vec<JoinHandle<Result<SessionOutcome, SessionError>>>,
}

impl SimulatedRelay {
    /// Start one handler per node and a relay that answers HELLOs with
    /// `topology` rows and forwards ROUTE packets to their destination
    fn start(topology: Vec<Vec<Cost>>, interval: Duration) -> Self {
        let (inbox_tx, mut inbox_rx) = mpsc::unbounded_channel::<Packet>();
        let mut outboxes = Vec::new();
        let mut nodes = Vec::new();

        for node_id in 0..topology.len() as NodeId {
            let (node_end, mut relay_end) = MemoryChannel::pair();
            let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Packet>();
            let inbox = inbox_tx.clone();

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        inbound = relay_end.receive() => match inbound {
                            Ok(packet) => {
                                if inbox.send(packet).is_err() {
                                    break;
                                }
                            }
                            Err(_) => break,
                        },
                        outbound = out_rx.recv() => match outbound {
                            Some(packet) => {
                                if relay_end.send(&packet).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            });

            let config = HandlerConfig {
                node_id,
                update_interval: interval,
            };
            nodes.push(tokio::spawn(ProtocolHandler::new(config, node_end).run()));
            outboxes.push(out_tx);
        }
        drop(inbox_tx);

        let routes = outboxes.clone();
        tokio::spawn(async move {
            while let Some(packet) = inbox_rx.recv().await {
                match packet.typ {
                    PacketType::Hello => {
                        let node = packet.src_node;
                        let reply = Packet::hello_with_costs(
                            RELAY_NODE_ID,
                            node,
                            topology[node as usize].clone(),
                        );
                        let _ = routes[node as usize].send(reply);
                    }
                    PacketType::Route => {
                        if let Some(outbox) = routes.get(packet.dst_node as usize) {
                            let _ = outbox.send(packet);
                        }
                    }
                    PacketType::Quit => {}
                }
            }
        });

        Self { outboxes, nodes }
    }

    fn change_link_costs(&self, node: NodeId, link_costs: Vec<Cost>) {
        let _ = self.outboxes[node as usize].send(Packet::route(RELAY_NODE_ID, node, link_costs));
    }

    async fn quit_all(self) -> Vec<SessionOutcome> {
        for (node, outbox) in self.outboxes.iter().enumerate() {
            let _ = outbox.send(Packet::quit(RELAY_NODE_ID, node as NodeId));
        }

        let mut outcomes = Vec::new();
        for handle in self.nodes {
            let outcome = handle.await.unwrap().unwrap();
            assert!(matches!(outcome.end, SessionEnd::Quit));
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[tokio::test(start_paused = true)]
async fn test_square_topology_converges() {
    let relay = SimulatedRelay::start(square_topology(), Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_secs(10)).await;

    let outcomes = relay.quit_all().await;

    let costs: Vec<_> = outcomes.iter().map(|o| o.table.min_cost.clone()).collect();
    let hops: Vec<_> = outcomes.iter().map(|o| o.table.next_hop.clone()).collect();
    assert_eq!(
        costs,
        vec![
            vec![0, 1, 3, 4],
            vec![1, 0, 2, 3],
            vec![3, 2, 0, 1],
            vec![4, 3, 1, 0],
        ]
    );
    assert_eq!(
        hops,
        vec![
            vec![0, 1, 1, 1],
            vec![0, 1, 2, 2],
            vec![1, 1, 2, 3],
            vec![2, 2, 2, 3],
        ]
    );
    for outcome in &outcomes {
        assert_eq!(outcome.table.reachable_count(), 3);
        assert!(outcome.stats.periodic_broadcasts >= 5);
        assert_eq!(outcome.stats.anomalies, 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cheaper_link_reconverges() {
    let relay = SimulatedRelay::start(square_topology(), Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_secs(5)).await;

    relay.change_link_costs(0, vec![0, 1, INF, 1]);
    relay.change_link_costs(3, vec![1, INF, 1, 0]);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let outcomes = relay.quit_all().await;

    let costs: Vec<_> = outcomes.iter().map(|o| o.table.min_cost.clone()).collect();
    let hops: Vec<_> = outcomes.iter().map(|o| o.table.next_hop.clone()).collect();
    assert_eq!(
        costs,
        vec![
            vec![0, 1, 2, 1],
            vec![1, 0, 2, 2],
            vec![2, 2, 0, 1],
            vec![1, 2, 1, 0],
        ]
    );
    assert_eq!(
        hops,
        vec![
            vec![0, 1, 3, 3],
            vec![0, 1, 2, 0],
            vec![3, 1, 2, 3],
            vec![0, 0, 2, 3],
        ]
    );
    assert_eq!(outcomes[0].stats.link_cost_changes, 1);
    assert_eq!(outcomes[3].stats.link_cost_changes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_isolated_node_sees_only_itself() {
    let topology = vec![vec![0, 1, INF], vec![1, 0, INF], vec![INF, INF, 0]];
    let relay = SimulatedRelay::start(topology, Duration::from_millis(500));
    tokio::time::sleep(Duration::from_secs(3)).await;

    let outcomes = relay.quit_all().await;

    assert_eq!(outcomes[0].table.min_cost, vec![0, 1, INF]);
    assert_eq!(outcomes[2].table.min_cost, vec![INF, INF, 0]);
    assert_eq!(outcomes[2].table.next_hop, vec![2, 2, 2]);
    assert_eq!(outcomes[2].stats.packets_sent, 1);
}
