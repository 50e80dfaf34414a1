// ==========================================
// I/O 自动分配测试
// ==========================================
// 职责: 验证填充顺序、容量约束与逐模块提交
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod allocator_test {
    use plc_io_provision::domain::hardware::{ChannelCapacity, NodeTemplate};
    use plc_io_provision::domain::types::SignalType;
    use plc_io_provision::engine::{
        EngineError, IoAllocator, ProvisioningOrchestrator, SignalClassifier,
    };
    use plc_io_provision::repository::{IoAddress, RepositoryError};

    use crate::test_helpers::{
        assert_capacity_invariant, count_assigned, insert_module_type, insert_n_signals,
        insert_signals, setup_env, FailPoint,
    };

    fn default_address() -> IoAddress {
        IoAddress {
            cpu: "CPU1".to_string(),
            rack: "0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_twenty_digital_inputs() {
        plc_io_provision::logging::init_test();
        let env = setup_env();
        insert_signals(
            &env,
            1,
            SignalType::DigitalInput,
            &[
                vec![Some("bordo_macchina"); 4],
                vec![None; 6],
                vec![Some("interno_quadro"); 6],
                vec![Some("pulsantiera"); 4],
            ]
            .concat(),
        );
        let orchestrator = env.orchestrator();

        let provision = orchestrator.provision(1).await.unwrap();
        assert_eq!(provision.modules_provisioned, 2);

        let report = orchestrator.allocate(1, provision.node_id).await.unwrap();
        assert_eq!(report.assigned_count, 20);
        assert_eq!(report.fills.len(), 2);
        assert_eq!((report.fills[0].slot, report.fills[0].assigned), (1, 16));
        assert_eq!((report.fills[1].slot, report.fills[1].assigned), (2, 4));

        // 槽位 2 只剩“其他”位置的最后 4 个
        let second = env
            .signal_repo
            .find_by_module(report.fills[1].module_id)
            .unwrap();
        assert!(second
            .iter()
            .all(|s| s.position == plc_io_provision::PositionTag::Other));

        assert_capacity_invariant(&env, provision.node_id);
        println!("✅ 端到端场景测试通过: 16 + 4 = {}", report.assigned_count);
    }

    #[tokio::test]
    async fn test_fill_prefers_interior_panel() {
        let env = setup_env();
        let di2 = insert_module_type(
            &env,
            "DI2",
            SignalType::DigitalInput,
            ChannelCapacity {
                di: 2,
                ..Default::default()
            },
        );
        let (node, _) = env
            .node_repo
            .get_or_create(1, &NodeTemplate::default())
            .unwrap();
        env.module_repo.append(&node, di2, 1).unwrap();

        let ids = insert_signals(
            &env,
            1,
            SignalType::DigitalInput,
            &[
                Some("interno_quadro"),
                Some("pulsantiera"),
                Some("interno_quadro"),
                Some("bordo_macchina"),
            ],
        );

        let report = env.orchestrator().allocate(1, node.node_id).await.unwrap();
        assert_eq!(report.assigned_count, 2);
        assert_eq!(report.fills[0].signal_ids, vec![ids[0], ids[2]]);

        let left: Vec<i64> = env
            .signal_repo
            .find_unassigned(1, Some(SignalType::DigitalInput))
            .unwrap()
            .iter()
            .map(|s| s.signal_id)
            .collect();
        assert_eq!(left, vec![ids[1], ids[3]]);
    }

    #[tokio::test]
    async fn test_allocation_writes_address_and_slot() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::AnalogInputVoltage, 5);
        let report = env.orchestrator().auto_configure(1).await.unwrap();
        assert_eq!(report.allocation.unwrap().assigned_count, 5);

        for module in env.module_repo.find_by_node(report.provision.node_id).unwrap() {
            for s in env.signal_repo.find_by_module(module.module_id).unwrap() {
                assert_eq!(s.slot, Some(module.slot));
                assert_eq!(s.cpu.as_deref(), Some("CPU1"));
                assert_eq!(s.rack.as_deref(), Some("0"));
            }
        }
    }

    #[tokio::test]
    async fn test_allocation_only_fills_remaining_capacity() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::DigitalOutput, 10);
        let orchestrator = env.orchestrator();
        let provision = orchestrator.provision(1).await.unwrap();
        let first = orchestrator.allocate(1, provision.node_id).await.unwrap();
        assert_eq!(first.assigned_count, 10);

        // 新增信号后再次分配，只填剩余 6 个通道
        insert_n_signals(&env, 1, SignalType::DigitalOutput, 9);
        let second = orchestrator.allocate(1, provision.node_id).await.unwrap();
        assert_eq!(second.assigned_count, 6);
        assert_eq!(second.fills[0].already_assigned, 10);
        assert_eq!(count_assigned(&env, 1), 16);
        assert_capacity_invariant(&env, provision.node_id);

        // 已满时不再分配
        let third = orchestrator.allocate(1, provision.node_id).await.unwrap();
        assert_eq!(third.assigned_count, 0);
    }

    #[tokio::test]
    async fn test_other_types_stay_off_module() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::DigitalInput, 3);
        insert_n_signals(&env, 1, SignalType::DigitalInputFailSafe, 3);
        let report = env.orchestrator().auto_configure(1).await.unwrap();

        let modules = env.module_repo.find_by_node(report.provision.node_id).unwrap();
        assert_eq!(modules.len(), 2);
        for module in modules {
            let module_type = env
                .module_type_repo
                .find_by_id(module.module_type_id)
                .unwrap()
                .unwrap();
            for s in env.signal_repo.find_by_module(module.module_id).unwrap() {
                assert_eq!(s.signal_type, module_type.governing_type);
            }
        }
    }

    #[tokio::test]
    async fn test_partial_success_keeps_earlier_modules() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::DigitalInput, 40);
        let provision = env.orchestrator().provision(1).await.unwrap();
        assert_eq!(provision.modules_provisioned, 3);

        let allocator = IoAllocator::new(
            env.repos_failing(FailPoint::AssignOnSlot(2)),
            SignalClassifier::default(),
            default_address(),
        );

        let err = allocator.allocate(1, provision.node_id).await.unwrap_err();
        match err {
            EngineError::AllocationAborted {
                slot, committed, ..
            } => {
                assert_eq!(slot, 2);
                assert_eq!(committed, 16);
            }
            other => panic!("意外的错误类型: {:?}", other),
        }

        // 槽位 1 已提交，槽位 2 / 3 未写入
        let modules = env.module_repo.find_by_node(provision.node_id).unwrap();
        assert_eq!(env.signal_repo.find_by_module(modules[0].module_id).unwrap().len(), 16);
        assert!(env.signal_repo.find_by_module(modules[1].module_id).unwrap().is_empty());
        assert!(env.signal_repo.find_by_module(modules[2].module_id).unwrap().is_empty());
        assert_eq!(count_assigned(&env, 1), 16);

        println!("✅ 部分成功策略测试通过");
    }

    #[tokio::test]
    async fn test_read_failure_on_later_module_reports_progress() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::DigitalInput, 40);
        let provision = env.orchestrator().provision(1).await.unwrap();

        let allocator = IoAllocator::new(
            env.repos_failing(FailPoint::CountOnSlot(2)),
            SignalClassifier::default(),
            default_address(),
        );

        let err = allocator.allocate(1, provision.node_id).await.unwrap_err();
        match err {
            EngineError::AllocationAborted {
                slot,
                committed,
                source,
                ..
            } => {
                assert_eq!(slot, 2);
                assert_eq!(committed, 16, "读取失败前已提交的数量应被报告");
                assert!(matches!(source, RepositoryError::DatabaseQueryError(_)));
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
        assert_eq!(count_assigned(&env, 1), 16);
    }

    #[tokio::test]
    async fn test_auto_configure_keeps_provision_on_allocation_failure() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::DigitalInput, 40);
        let orchestrator = ProvisioningOrchestrator::new(
            env.repos_failing(FailPoint::AssignOnSlot(2)),
            env.config_manager.clone(),
        );

        let err = orchestrator.auto_configure(1).await.unwrap_err();
        match err {
            EngineError::AutoConfigureIncomplete { provision, source } => {
                assert_eq!(provision.modules_provisioned, 3);
                assert!(matches!(
                    *source,
                    EngineError::AllocationAborted {
                        slot: 2,
                        committed: 16,
                        ..
                    }
                ));
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
        let nodes = env.node_repo.list_by_project(1).unwrap();
        assert_eq!(env.module_repo.find_by_node(nodes[0].node_id).unwrap().len(), 3);
        assert_eq!(count_assigned(&env, 1), 16);
    }

    #[tokio::test]
    async fn test_allocate_without_modules_fails() {
        let env = setup_env();
        let (node, _) = env
            .node_repo
            .get_or_create(1, &NodeTemplate::default())
            .unwrap();
        let err = env.orchestrator().allocate(1, node.node_id).await.unwrap_err();
        assert!(matches!(err, EngineError::NoModules { node_id } if node_id == node.node_id));
    }

    #[tokio::test]
    async fn test_allocate_rejects_foreign_node() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::DigitalInput, 1);
        let provision = env.orchestrator().provision(1).await.unwrap();

        let err = env
            .orchestrator()
            .allocate(2, provision.node_id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert_eq!(count_assigned(&env, 1), 0);
    }

    #[tokio::test]
    async fn test_unresolved_module_type_is_skipped() {
        let env = setup_env();
        let relay = env
            .module_type_repo
            .insert(&plc_io_provision::repository::NewModuleType {
                name: "RELAY8".to_string(),
                description: None,
                kind_tag: "Relay".to_string(),
                capacity: ChannelCapacity {
                    dout: 8,
                    ..Default::default()
                },
            })
            .unwrap();
        let (node, _) = env
            .node_repo
            .get_or_create(1, &NodeTemplate::default())
            .unwrap();
        env.module_repo.append(&node, relay, 1).unwrap();
        insert_n_signals(&env, 1, SignalType::DigitalOutput, 2);

        let report = env.orchestrator().allocate(1, node.node_id).await.unwrap();
        assert_eq!(report.assigned_count, 0);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("Relay"));
    }
}
