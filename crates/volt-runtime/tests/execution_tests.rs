//! Transaction execution scenarios
//!
//! Covers the accept, revert and reject outcomes of `Runtime::execute_transaction`
//! and the gas and energy accounting around them.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::*;
use k256::ecdsa::SigningKey;
use proptest::prelude::*;
use volt_builtins::abi::{self, Token};
use volt_builtins::ENERGY;
use volt_evm::{contract_address, VmError};
use volt_metrics::ExecutionMetrics;
use volt_primitives::{H256, U256};
use volt_runtime::RuntimeError;
use volt_types::{Clause, TransactionBuilder};

fn slot(n: u8) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[31] = n;
    H256::from_bytes(bytes)
}

fn h256(n: u64) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&n.to_be_bytes());
    H256::from_bytes(bytes)
}

// ==================== Accepted Transactions ====================

#[test]
fn test_value_transfer_succeeds() {
    let sender = TestAccount::random();
    let recipient = addr(0xb0);
    let mut runtime = TestWorld::new()
        .fund(sender.address(), FUNDED_BALANCE, FUNDED_ENERGY)
        .fund(recipient, 1, 0)
        .runtime();

    let tx = sender.sign(vec![Clause::transfer(recipient, U256::from(500))], DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(!receipt.reverted);
    assert_eq!(receipt.gas_used, 21_000);
    assert_eq!(receipt.gas_payer, sender.address());
    assert_eq!(receipt.outputs.len(), 1);
    assert_eq!(outputs.len(), 1);

    assert_eq!(balance_of(&runtime, &recipient), U256::from(501));
    assert_eq!(balance_of(&runtime, &sender.address()), U256::from(FUNDED_BALANCE - 500));
    assert_eq!(
        energy_of(&runtime, &sender.address()),
        U256::from(FUNDED_ENERGY - receipt.gas_used * GAS_PRICE)
    );
}

#[test]
fn test_zero_clauses_charge_intrinsic_gas() {
    let sender = TestAccount::random();
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .runtime();

    let tx = sender.sign(vec![], DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(!receipt.reverted);
    assert_eq!(receipt.gas_used, 21_000);
    assert!(receipt.outputs.is_empty());
    assert!(outputs.is_empty());
    assert_eq!(energy_of(&runtime, &sender.address()), U256::from(FUNDED_ENERGY - 21_000 * GAS_PRICE));
}

#[test]
fn test_contract_creation() {
    let sender = TestAccount::random();
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .runtime();

    // MSTORE8(0, 0x00), RETURN(0, 1): deploys a single STOP
    let init = [0x60, 0x00, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0xf3];
    let tx = sender.sign(vec![Clause::create(init.to_vec())], DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(!receipt.reverted);
    let expected = contract_address(&tx.id().unwrap(), 0, 0);
    assert_eq!(outputs[0].contract_address, Some(expected));
    assert_eq!(runtime.state().code(&expected).unwrap().as_ref(), &[0x00]);
    assert!(receipt.gas_used > tx.intrinsic_gas().unwrap());
}

#[test]
fn test_logs_copied_into_receipt() {
    let sender = TestAccount::random();
    let recipient = addr(0xb1);
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .runtime();

    let data = abi::encode_function_call(
        "transfer(address,uint256)",
        &[Token::Address(recipient), Token::Uint(U256::from(777))],
    );
    let tx = sender.sign(vec![Clause::call(ENERGY, data)], DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(!receipt.reverted);
    assert_eq!(receipt.gas_used, tx.intrinsic_gas().unwrap() + volt_builtins::WRITE_GAS);
    assert_eq!(receipt.outputs[0].logs, outputs[0].logs);

    let log = &receipt.outputs[0].logs[0];
    assert_eq!(log.address, ENERGY);
    assert_eq!(log.topics[0], abi::event_topic("Transfer(address,address,uint256)"));
    assert_eq!(log.topics[1], sender.address().to_word());
    assert_eq!(log.topics[2], recipient.to_word());
    assert_eq!(log.data, Bytes::from(abi::encode(&[Token::Uint(U256::from(777))])));

    assert_eq!(energy_of(&runtime, &recipient), U256::from(777));
    assert_eq!(
        energy_of(&runtime, &sender.address()),
        U256::from(FUNDED_ENERGY - 777 - receipt.gas_used * GAS_PRICE)
    );
}

// ==================== Reverted Transactions ====================

#[test]
fn test_failing_clause_reverts_earlier_clauses() {
    let sender = TestAccount::random();
    let recipient = addr(0xb2);
    let reverter = addr(0xc0);
    let mut runtime = TestWorld::new()
        .fund(sender.address(), FUNDED_BALANCE, FUNDED_ENERGY)
        .deploy(reverter, REVERT_CODE)
        .runtime();

    let clauses = vec![
        Clause::transfer(recipient, U256::from(500)),
        Clause::call(reverter, Bytes::new()),
        Clause::transfer(recipient, U256::from(1)),
    ];
    let tx = sender.sign(clauses, DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(receipt.reverted);
    assert!(receipt.outputs.is_empty());
    // the third clause never ran
    assert_eq!(outputs.len(), 2);
    assert!(outputs[0].vm_err.is_none());
    assert_eq!(outputs[1].vm_err, Some(VmError::Revert(Vec::new())));

    assert_eq!(receipt.gas_used, tx.intrinsic_gas().unwrap() + REVERT_CODE_GAS);
    assert_eq!(balance_of(&runtime, &recipient), U256::zero());
    assert_eq!(balance_of(&runtime, &sender.address()), U256::from(FUNDED_BALANCE));
    assert_eq!(
        energy_of(&runtime, &sender.address()),
        U256::from(FUNDED_ENERGY - receipt.gas_used * GAS_PRICE)
    );
}

#[test]
fn test_invalid_opcode_burns_all_gas() {
    let sender = TestAccount::random();
    let broken = addr(0xc1);
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .deploy(broken, &[0xfe])
        .runtime();

    let tx = sender.sign(vec![Clause::call(broken, Bytes::new())], 50_000, GAS_PRICE);
    let (receipt, _) = runtime.execute_transaction(&tx).unwrap();

    assert!(receipt.reverted);
    assert_eq!(receipt.gas_used, 50_000);
    assert_eq!(energy_of(&runtime, &sender.address()), U256::from(FUNDED_ENERGY - 50_000 * GAS_PRICE));
}

#[test]
fn test_insufficient_value_reverts() {
    let sender = TestAccount::random();
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 10, FUNDED_ENERGY)
        .runtime();

    let tx = sender.sign(vec![Clause::transfer(addr(0xb3), U256::from(11))], DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(receipt.reverted);
    assert_eq!(outputs[0].vm_err, Some(VmError::InsufficientBalance));
    assert_eq!(receipt.gas_used, 21_000);
}

#[test]
fn test_recursion_to_depth_limit_yields_receipt() {
    let sender = TestAccount::random();
    let recursive = addr(0xc7);
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, 0)
        .deploy(recursive, COUNTING_RECURSION_CODE)
        .runtime();

    // enough gas that the 63/64 rule still leaves the deepest frame room to run
    let tx = sender.sign(vec![Clause::call(recursive, Bytes::new())], 1_000_000_000_000, 0);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(!receipt.reverted);
    assert!(outputs[0].is_success());
    let frames = runtime.config().vm.max_call_depth as u64 + 1;
    assert_eq!(runtime.state().storage(&recursive, &slot(0)).unwrap(), h256(frames));
}

// ==================== Rejected Transactions ====================

#[test]
fn test_insufficient_energy_rejected() {
    let sender = TestAccount::random();
    let mut runtime = TestWorld::new()
        .fund(sender.address(), FUNDED_BALANCE, 1_000)
        .runtime();

    let tx = sender.sign(vec![Clause::transfer(addr(0xb4), U256::from(1))], DEFAULT_GAS, GAS_PRICE);
    let err = runtime.execute_transaction(&tx).unwrap_err();

    match err {
        RuntimeError::InsufficientEnergy { payer, required } => {
            assert_eq!(payer, sender.address());
            assert_eq!(required, U256::from(DEFAULT_GAS * GAS_PRICE));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(runtime.state().changes().is_empty());
    assert_eq!(energy_of(&runtime, &sender.address()), U256::from(1_000));
}

#[test]
fn test_gas_below_intrinsic_rejected() {
    let sender = TestAccount::random();
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .runtime();

    let tx = sender.sign(vec![Clause::call(addr(0xb5), vec![0xff; 4])], 21_000, GAS_PRICE);
    let err = runtime.execute_transaction(&tx).unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::InsufficientGas { intrinsic: 21_272, provided: 21_000 }
    ));
    assert!(runtime.state().changes().is_empty());
}

#[test]
fn test_unsigned_transaction_rejected() {
    let tx = TransactionBuilder::new()
        .clause(Clause::transfer(addr(0xb6), U256::one()))
        .gas(DEFAULT_GAS)
        .build()
        .unwrap();
    let mut runtime = TestWorld::new().runtime();

    let err = runtime.execute_transaction(&tx).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidSignature(_)));
}

#[test]
fn test_prepaid_overflow_is_malformed() {
    let key = SigningKey::random(&mut rand::thread_rng());
    let tx = TransactionBuilder::new()
        .gas_price(U256::MAX)
        .gas(DEFAULT_GAS)
        .sign(&key)
        .unwrap();
    let mut runtime = TestWorld::new().runtime();

    let err = runtime.execute_transaction(&tx).unwrap_err();
    assert!(matches!(err, RuntimeError::MalformedTransaction(_)));
}

// ==================== Accounting Properties ====================

#[test]
fn test_receipts_are_reproducible() {
    let sender = TestAccount::random();
    let reverter = addr(0xc2);
    let world = || {
        TestWorld::new()
            .fund(sender.address(), FUNDED_BALANCE, FUNDED_ENERGY)
            .deploy(reverter, REVERT_CODE)
            .runtime()
    };

    for clauses in [
        vec![Clause::transfer(addr(0xb7), U256::from(3))],
        vec![Clause::transfer(addr(0xb7), U256::from(3)), Clause::call(reverter, Bytes::new())],
    ] {
        let tx = sender.sign(clauses, DEFAULT_GAS, GAS_PRICE);
        let (first, _) = world().execute_transaction(&tx).unwrap();
        let (second, _) = world().execute_transaction(&tx).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.hash(), second.hash());
    }
}

#[test]
fn test_metrics_recorded() {
    let sender = TestAccount::random();
    let metrics = Arc::new(ExecutionMetrics::new());
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .deploy(addr(0xc3), REVERT_CODE)
        .runtime()
        .with_metrics(Arc::clone(&metrics));

    runtime.execute_transaction(&sender.sign(vec![], DEFAULT_GAS, GAS_PRICE)).unwrap();
    runtime
        .execute_transaction(&sender.sign(vec![Clause::call(addr(0xc3), Bytes::new())], DEFAULT_GAS, GAS_PRICE))
        .unwrap();
    runtime
        .execute_transaction(&sender.sign(vec![], 100, GAS_PRICE))
        .unwrap_err();

    assert_eq!(metrics.executed(), 2);
    assert_eq!(metrics.reverted(), 1);
    assert_eq!(metrics.clauses(), 1);
    assert_eq!(metrics.rejections_for("insufficient_gas"), 1);
}

#[test]
fn test_refund_below_cap_applied_in_full() {
    let sender = TestAccount::random();
    let contract = addr(0xc5);
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .deploy(contract, SET_TWO_CLEAR_ONE_CODE)
        .store(contract, slot(0), slot(1))
        .runtime();

    let tx = sender.sign(vec![Clause::call(contract, Bytes::new())], DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(!receipt.reverted);
    assert_eq!(outputs[0].refund_gas, 15_000);
    // half of 45018 is above the 15000 refund, so nothing is capped
    assert_eq!(receipt.gas_used, 21_000 + SET_TWO_CLEAR_ONE_GAS - 15_000);
    assert_eq!(
        energy_of(&runtime, &sender.address()),
        U256::from(FUNDED_ENERGY - receipt.gas_used * GAS_PRICE)
    );
}

#[test]
fn test_refund_capped_per_clause() {
    let sender = TestAccount::random();
    let generous = addr(0xc5);
    let clearing = addr(0xc6);
    let mut runtime = TestWorld::new()
        .fund(sender.address(), 0, FUNDED_ENERGY)
        .deploy(generous, SET_TWO_CLEAR_ONE_CODE)
        .store(generous, slot(0), slot(1))
        .deploy(clearing, CLEAR_SLOT_CODE)
        .store(clearing, slot(0), slot(1))
        .runtime();

    let clauses = vec![Clause::call(generous, Bytes::new()), Clause::call(clearing, Bytes::new())];
    let tx = sender.sign(clauses, DEFAULT_GAS, GAS_PRICE);
    let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

    assert!(!receipt.reverted);
    assert_eq!(outputs[0].refund_gas, 15_000);
    assert_eq!(outputs[1].refund_gas, 15_000);
    // the first clause keeps its whole refund, the second only half of its usage
    let first = SET_TWO_CLEAR_ONE_GAS - 15_000;
    let second = CLEAR_SLOT_GAS - CLEAR_SLOT_GAS / 2;
    assert_eq!(receipt.gas_used, tx.intrinsic_gas().unwrap() + first + second);
    assert_eq!(tx.intrinsic_gas().unwrap(), 37_000);
}

proptest! {
    #[test]
    fn test_refund_capped_at_half_of_used(gas in 30_000u64..2_000_000, price in 1u64..1_000_000) {
        let sender = TestAccount::random();
        let contract = addr(0xc4);
        let mut runtime = TestWorld::new()
            .fund(sender.address(), 0, u64::MAX)
            .deploy(contract, CLEAR_SLOT_CODE)
            .store(contract, slot(0), slot(1))
            .runtime();

        let tx = sender.sign(vec![Clause::call(contract, Bytes::new())], gas, price);
        let (receipt, outputs) = runtime.execute_transaction(&tx).unwrap();

        prop_assert!(!receipt.reverted);
        prop_assert_eq!(outputs[0].refund_gas, 15_000);
        // the clearing refund exceeds half of what the clause used
        prop_assert_eq!(receipt.gas_used, 21_000 + CLEAR_SLOT_GAS - CLEAR_SLOT_GAS / 2);
        prop_assert_eq!(runtime.state().storage(&contract, &slot(0)).unwrap(), H256::ZERO);
        prop_assert_eq!(
            energy_of(&runtime, &sender.address()),
            U256::from(u64::MAX) - U256::from(receipt.gas_used) * U256::from(price)
        );
    }
}
