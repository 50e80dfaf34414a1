// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证事务边界、槽位重排与信号级联解除
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod repository_integration_test {
    use plc_io_provision::domain::hardware::{NewModuleInstance, NodeTemplate};
    use plc_io_provision::domain::signal::NewIoSignal;
    use plc_io_provision::domain::types::{PositionTag, SignalType};
    use plc_io_provision::repository::{IoAddress, RepositoryError};

    use rusqlite::params;

    use crate::test_helpers::{count_assigned, insert_n_signals, node_slots, setup_env};

    fn di16_id(env: &crate::test_helpers::TestEnv) -> i64 {
        env.module_type_repo
            .find_by_name("DI16")
            .unwrap()
            .unwrap()
            .module_type_id
    }

    #[test]
    fn test_signal_insert_normalizes_type_tag() {
        let env = setup_env();

        let legacy = NewIoSignal {
            project_id: 1,
            code: "B01".to_string(),
            description: Some("急停按钮".to_string()),
            type_tag: "Input Digitale Fail-Safe".to_string(),
            position: Some("pulsantiera".to_string()),
        };
        let id = env.signal_repo.insert(&legacy).unwrap();

        let unknown = NewIoSignal {
            type_tag: "Encoder".to_string(),
            code: "E01".to_string(),
            ..legacy.clone()
        };
        let unknown_id = env.signal_repo.insert(&unknown).unwrap();

        let stored = env.signal_repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(stored.type_tag, "DIGITAL_INPUT_FS");
        assert_eq!(stored.signal_type, Some(SignalType::DigitalInputFailSafe));
        assert_eq!(stored.position, PositionTag::PushbuttonStation);
        assert!(!stored.is_assigned());

        let stored = env.signal_repo.find_by_id(unknown_id).unwrap().unwrap();
        assert_eq!(stored.type_tag, "Encoder");
        assert_eq!(stored.signal_type, None);

        println!("✅ 类型标签规范化测试通过");
    }

    #[test]
    fn test_signal_insert_rejects_empty_code() {
        let env = setup_env();
        let err = env
            .signal_repo
            .insert(&NewIoSignal::new(1, "  ", SignalType::DigitalInput, None))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
    }

    #[test]
    fn test_node_get_or_create_is_stable() {
        let env = setup_env();
        let template = NodeTemplate::default();

        let (first, created) = env.node_repo.get_or_create(3, &template).unwrap();
        assert!(created);
        let (second, created) = env.node_repo.get_or_create(3, &template).unwrap();
        assert!(!created);
        assert_eq!(first.node_id, second.node_id);

        // 不同项目各自拥有节点
        let (other, created) = env.node_repo.get_or_create(4, &template).unwrap();
        assert!(created);
        assert_ne!(other.node_id, first.node_id);
        assert_eq!(env.node_repo.list_by_project(3).unwrap().len(), 1);
    }

    #[test]
    fn test_replace_rolls_back_on_storage_error() {
        let env = setup_env();
        let di16 = di16_id(&env);
        let (node, _) = env
            .node_repo
            .get_or_create(1, &NodeTemplate::default())
            .unwrap();

        let original = env
            .module_repo
            .replace_for_node(
                &node,
                &[NewModuleInstance {
                    module_type_id: di16,
                    slot: 1,
                    quantity: 1,
                }],
            )
            .unwrap();
        let module = original.created[0].clone();

        let ids = insert_n_signals(&env, 1, SignalType::DigitalInput, 3);
        env.signal_repo.assign_batch(&module, &ids, None).unwrap();

        // 第二个模块引用不存在的目录条目，外键失败
        let err = env
            .module_repo
            .replace_for_node(
                &node,
                &[
                    NewModuleInstance {
                        module_type_id: di16,
                        slot: 1,
                        quantity: 1,
                    },
                    NewModuleInstance {
                        module_type_id: 9_999,
                        slot: 2,
                        quantity: 1,
                    },
                ],
            )
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));

        // 原模块与信号分配保持不变
        let modules = env.module_repo.find_by_node(node.node_id).unwrap();
        assert_eq!(modules, vec![module.clone()]);
        assert_eq!(env.signal_repo.find_by_module(module.module_id).unwrap().len(), 3);

        println!("✅ 整体替换回滚测试通过");
    }

    #[test]
    fn test_replace_releases_signals_of_old_modules() {
        let env = setup_env();
        let di16 = di16_id(&env);
        let (node, _) = env
            .node_repo
            .get_or_create(1, &NodeTemplate::default())
            .unwrap();

        let first = env
            .module_repo
            .replace_for_node(
                &node,
                &[NewModuleInstance {
                    module_type_id: di16,
                    slot: 1,
                    quantity: 1,
                }],
            )
            .unwrap();
        let ids = insert_n_signals(&env, 1, SignalType::DigitalInput, 5);
        let address = IoAddress {
            cpu: "CPU1".to_string(),
            rack: "0".to_string(),
        };
        env.signal_repo
            .assign_batch(&first.created[0], &ids, Some(&address))
            .unwrap();

        let second = env.module_repo.replace_for_node(&node, &[]).unwrap();
        assert_eq!(second.removed_modules, 1);
        assert_eq!(second.released_signals, 5);
        assert!(second.created.is_empty());

        for id in ids {
            let s = env.signal_repo.find_by_id(id).unwrap().unwrap();
            assert_eq!(s.module_id, None);
            assert_eq!(s.slot, None);
            assert_eq!(s.cpu, None);
            assert_eq!(s.rack, None);
        }
    }

    #[test]
    fn test_delete_and_renumber_keeps_slots_contiguous() {
        let env = setup_env();
        let di16 = di16_id(&env);
        let (node, _) = env
            .node_repo
            .get_or_create(1, &NodeTemplate::default())
            .unwrap();

        let m1 = env.module_repo.append(&node, di16, 1).unwrap();
        let m2 = env.module_repo.append(&node, di16, 1).unwrap();
        let m3 = env.module_repo.append(&node, di16, 1).unwrap();
        assert_eq!((m1.slot, m2.slot, m3.slot), (1, 2, 3));

        let on_m2 = insert_n_signals(&env, 1, SignalType::DigitalInput, 2);
        let on_m3 = insert_n_signals(&env, 1, SignalType::DigitalInput, 2);
        env.signal_repo.assign_batch(&m2, &on_m2, None).unwrap();
        env.signal_repo.assign_batch(&m3, &on_m3, None).unwrap();

        let removal = env.module_repo.delete_and_renumber(m2.module_id).unwrap();
        assert_eq!(removal.removed.slot, 2);
        assert_eq!(removal.renumbered_modules, 1);
        assert_eq!(removal.released_signals, 2);

        assert_eq!(node_slots(&env, node.node_id), vec![1, 2]);
        let moved = env.module_repo.find_by_id(m3.module_id).unwrap().unwrap();
        assert_eq!(moved.slot, 2);

        // 被删模块上的信号解除分配
        for id in on_m2 {
            assert!(!env.signal_repo.find_by_id(id).unwrap().unwrap().is_assigned());
        }
        // 前移模块上的信号槽位同步
        for id in on_m3 {
            let s = env.signal_repo.find_by_id(id).unwrap().unwrap();
            assert_eq!(s.module_id, Some(m3.module_id));
            assert_eq!(s.slot, Some(2));
        }

        // 追加模块接在末尾
        let m4 = env.module_repo.append(&node, di16, 1).unwrap();
        assert_eq!(m4.slot, 3);

        println!("✅ 删除重排测试通过");
    }

    #[test]
    fn test_delete_missing_module_is_not_found() {
        let env = setup_env();
        let err = env.module_repo.delete_and_renumber(404).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_clear_reports_previous_state() {
        let env = setup_env();
        let di16 = di16_id(&env);
        let (node, _) = env
            .node_repo
            .get_or_create(1, &NodeTemplate::default())
            .unwrap();
        let module = env.module_repo.append(&node, di16, 1).unwrap();
        let ids = insert_n_signals(&env, 1, SignalType::DigitalInput, 1);
        env.signal_repo.assign_batch(&module, &ids, None).unwrap();

        assert!(env.signal_repo.clear(ids[0]).unwrap());
        assert!(!env.signal_repo.clear(ids[0]).unwrap());
        assert!(matches!(
            env.signal_repo.clear(12_345),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_unassigned_listing_preserves_insertion_order() {
        let env = setup_env();
        let di = insert_n_signals(&env, 1, SignalType::DigitalInput, 3);
        let dout = insert_n_signals(&env, 1, SignalType::DigitalOutput, 2);
        insert_n_signals(&env, 2, SignalType::DigitalInput, 4);

        let listed: Vec<i64> = env
            .signal_repo
            .find_unassigned(1, Some(SignalType::DigitalInput))
            .unwrap()
            .iter()
            .map(|s| s.signal_id)
            .collect();
        assert_eq!(listed, di);

        let all = env.signal_repo.find_unassigned(1, None).unwrap();
        assert_eq!(all.len(), di.len() + dout.len());
        assert_eq!(env.signal_repo.count_by_type(2, SignalType::DigitalInput).unwrap(), 4);
    }

    #[tokio::test]
    async fn test_legacy_type_labels_are_counted_and_allocated() {
        let env = setup_env();
        insert_n_signals(&env, 1, SignalType::DigitalInput, 1);
        {
            // 外部导入程序直接写入的历史标签
            let conn = env.conn.lock().unwrap();
            for (code, tag) in [("X1", "Input Digitale"), ("X2", " input digitale ")] {
                conn.execute(
                    "INSERT INTO io_signal (project_id, code, signal_type) VALUES (?1, ?2, ?3)",
                    params![1, code, tag],
                )
                .unwrap();
            }
        }

        assert_eq!(env.signal_repo.count_by_type(1, SignalType::DigitalInput).unwrap(), 3);
        assert_eq!(
            env.signal_repo
                .find_unassigned(1, Some(SignalType::DigitalInput))
                .unwrap()
                .len(),
            3
        );

        let report = env.orchestrator().auto_configure(1).await.unwrap();
        assert_eq!(report.provision.modules_provisioned, 1);
        assert_eq!(report.allocation.unwrap().assigned_count, 3);
        assert_eq!(count_assigned(&env, 1), 3);

        let module = &env.module_repo.find_by_node(report.provision.node_id).unwrap()[0];
        assert_eq!(
            env.signal_repo
                .count_by_module_and_type(module.module_id, SignalType::DigitalInput)
                .unwrap(),
            3,
            "历史标签的信号也应计入模块容量"
        );
    }
}
