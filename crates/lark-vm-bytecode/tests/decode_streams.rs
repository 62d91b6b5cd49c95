//! Decoding of whole tag bodies built with the stream builder

use lark_vm_bytecode::{
    Action, ActionCode, ActionStreamBuilder, BytecodeError, DoAction, DoInitAction, JumpTarget,
    MAX_NESTING, PreloadFlags, PushValue, RegisterParam, decode_actions, disassemble,
};

#[test]
fn test_stays_in_sync_after_unknown_codes() {
    let bytes = ActionStreamBuilder::new()
        .record(0xC3, &[1, 2, 3, 4, 5])
        .raw(&[0x70])
        .record(0x8F, &[0; 7])
        .action(ActionCode::Stop)
        .finish();
    let block = decode_actions(&bytes).unwrap();
    let names: Vec<_> = block.actions().map(Action::name).collect();
    assert_eq!(names, vec!["Unknown", "Unknown", "Try", "Stop"]);
    assert_eq!(block.get(3).unwrap().offset, 8 + 1 + 10);
}

#[test]
fn test_define_function2_layout() {
    let body = ActionStreamBuilder::new()
        .push(&[PushValue::Register(2)])
        .action(ActionCode::Return);
    let bytes = ActionStreamBuilder::new()
        .define_function2(
            "area",
            5,
            PreloadFlags::new(PreloadFlags::PRELOAD_THIS | PreloadFlags::SUPPRESS_ARGUMENTS),
            &[(2, "w"), (0, "h")],
            body,
        )
        .action(ActionCode::Pop)
        .finish();
    let block = decode_actions(&bytes).unwrap();
    assert_eq!(block.len(), 2);
    let Action::DefineFunction2(def) = &block.get(0).unwrap().action else {
        panic!("expected DefineFunction2");
    };
    assert_eq!(def.name, "area");
    assert_eq!(def.register_count, 5);
    assert!(def.flags.preload_this());
    assert!(def.flags.suppress_arguments());
    assert_eq!(
        def.params,
        vec![
            RegisterParam {
                register: Some(2),
                name: "w".into()
            },
            RegisterParam {
                register: None,
                name: "h".into()
            },
        ]
    );
    assert_eq!(def.body.len(), 2);
    assert_eq!(block.get(1).unwrap().action, Action::Pop);
}

#[test]
fn test_truncated_function_body_fails_tag() {
    let mut bytes = ActionStreamBuilder::new()
        .define_function("f", &[], ActionStreamBuilder::new().action(ActionCode::Play))
        .into_body();
    // Drop the body byte
    bytes.pop();
    let err = DoAction::decode(&bytes).unwrap_err();
    assert!(matches!(
        err,
        BytecodeError::Truncated {
            code: 0x9B,
            declared: 1,
            available: 0,
            ..
        }
    ));
}

#[test]
fn test_do_init_action_and_branch_resolution() {
    let stream = ActionStreamBuilder::new()
        .push(&[PushValue::Boolean(true)])
        .branch_if(1)
        .action(ActionCode::Play)
        .action(ActionCode::Stop)
        .finish();
    let mut body = 9u16.to_le_bytes().to_vec();
    body.extend_from_slice(&stream);
    let tag = DoInitAction::decode(&body).unwrap();
    assert_eq!(tag.sprite_id, 9);
    assert_eq!(tag.actions.resolve_jump(1, 1), JumpTarget::Record(3));
    assert_eq!(tag.actions.resolve_jump(1, 2), JumpTarget::End);
}

#[test]
fn test_disassembly_lists_nested_bodies() {
    let bytes = ActionStreamBuilder::new()
        .with_body(ActionStreamBuilder::new().action(ActionCode::Play))
        .jump(-11)
        .finish();
    let block = decode_actions(&bytes).unwrap();
    let text = disassemble(&block);
    assert!(text.contains("0000 With"));
    assert!(text.contains("  0000 Play"));
    assert!(text.contains("Jump -11 -> 0000"));
    assert!(serde_json::to_string(&block).unwrap().contains("\"Play\""));
}

/// `levels` `With` records, each wrapping the next, innermost empty
fn nested_with(levels: usize) -> Vec<u8> {
    let mut body = Vec::new();
    for _ in 0..levels {
        let size = (body.len() as u16).to_le_bytes();
        let mut outer = vec![0x94, 0x02, 0x00, size[0], size[1]];
        outer.extend_from_slice(&body);
        body = outer;
    }
    body.push(0);
    body
}

#[test]
fn test_nesting_at_limit_decodes() {
    let block = decode_actions(&nested_with(MAX_NESTING)).unwrap();
    let mut depth = 0;
    let mut current = &block;
    while let Some(Action::With(inner)) = current.actions().next() {
        depth += 1;
        current = inner;
    }
    assert_eq!(depth, MAX_NESTING);
}

#[test]
fn test_nesting_past_limit_is_rejected() {
    let err = decode_actions(&nested_with(MAX_NESTING + 1)).unwrap_err();
    assert!(matches!(
        err,
        BytecodeError::NestingTooDeep { limit: MAX_NESTING, .. }
    ));
}

#[test]
fn test_deeply_nested_tag_fails_cleanly() {
    let err = decode_actions(&nested_with(12_000)).unwrap_err();
    assert!(matches!(err, BytecodeError::NestingTooDeep { .. }));
}

#[test]
fn test_terminator_inside_body_is_skipped() {
    let bytes = ActionStreamBuilder::new()
        .with_body(
            ActionStreamBuilder::new()
                .action(ActionCode::Play)
                .raw(&[0x00])
                .action(ActionCode::Stop),
        )
        .action(ActionCode::NextFrame)
        .finish();
    let block = decode_actions(&bytes).unwrap();
    let Action::With(body) = &block.get(0).unwrap().action else {
        panic!("expected With");
    };
    let names: Vec<_> = body.actions().map(Action::name).collect();
    assert_eq!(names, vec!["Play", "Stop"]);
    assert_eq!(body.byte_len(), 3);
    assert_eq!(body.get(1).unwrap().offset, 2);
    assert_eq!(block.get(1).unwrap().action, Action::NextFrame);
}
