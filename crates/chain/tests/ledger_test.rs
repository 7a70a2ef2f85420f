use miniledger_chain::{
    collect_reward, collect_tx_fees, config_state_change, funds_state_change, verify_funds_batch,
    verify_funds_tx, BlockTransactions, Ledger, LedgerConfig, LedgerError, ParameterBounds,
    RollbackPolicy, VerifiedFundsTx,
};
use miniledger_core::{
    hash_concat, merkle_root, Account, ConfigTx, FundsTx, Hash, Keypair, ParameterHistory,
    ParameterId, Transaction, WireFormat, MAX_MONEY,
};
use miniledger_state::AccountStore;

fn funded_store(balances: &[u64]) -> (AccountStore, Vec<Keypair>) {
    let mut store = AccountStore::new();
    let keys: Vec<Keypair> = balances.iter().map(|_| Keypair::generate()).collect();
    for (kp, balance) in keys.iter().zip(balances) {
        store
            .put_account(Account::with_balance(kp.public_key, *balance))
            .unwrap();
    }
    (store, keys)
}

fn signed(from: &Keypair, to: &Keypair, amount: u32, fee: u16, tx_count: u32) -> FundsTx {
    FundsTx::new(
        0,
        amount,
        fee,
        tx_count,
        &from.account_hash(),
        &to.account_hash(),
        from,
    )
    .unwrap()
}

fn verified(store: &AccountStore, tx: &FundsTx) -> VerifiedFundsTx {
    verify_funds_tx(store, tx).unwrap()
}

fn balance(store: &AccountStore, kp: &Keypair) -> u64 {
    store.get_account(&kp.account_hash()).unwrap().balance
}

#[test]
fn test_transfers_conserve_supply() {
    let (mut store, keys) = funded_store(&[10_000, 5_000, 0]);
    let before = store.total_supply();

    let txs = vec![
        signed(&keys[0], &keys[1], 1200, 3, 0),
        signed(&keys[1], &keys[2], 700, 2, 0),
        signed(&keys[0], &keys[2], 50, 1, 1),
    ];
    let txs = verify_funds_batch(&store, &txs).unwrap();
    funds_state_change(&mut store, &txs, RollbackPolicy::Legacy).unwrap();

    assert_eq!(store.total_supply(), before);
    assert_eq!(balance(&store, &keys[0]), 10_000 - 1200 - 50);
    assert_eq!(balance(&store, &keys[1]), 5_000 + 1200 - 700);
    assert_eq!(balance(&store, &keys[2]), 750);
}

#[test]
fn test_fees_conserve_supply_and_reward_mints() {
    let (mut store, keys) = funded_store(&[10_000, 0, 0]);
    let miner = &keys[2];
    let before = store.total_supply();

    let txs = verify_funds_batch(&store, &[signed(&keys[0], &keys[1], 100, 9, 0)]).unwrap();
    funds_state_change(&mut store, &txs, RollbackPolicy::Legacy).unwrap();
    collect_tx_fees(&mut store, &txs, &[], &[], &miner.account_hash()).unwrap();
    assert_eq!(store.total_supply(), before);
    assert_eq!(balance(&store, miner), 9);

    collect_reward(&mut store, 40, &miner.account_hash()).unwrap();
    assert_eq!(store.total_supply(), before + 40);
}

#[test]
fn test_legacy_rollback_boundary() {
    // When transaction k fails, [0, k-1) is undone and transaction k-1 is kept.
    // This mirrors the historical arithmetic and is asserted as-is.
    let (mut store, keys) = funded_store(&[1_000, 1_000, 1_000, 1_000, 0]);
    let sink = &keys[4];
    let txs: Vec<_> = keys[..4]
        .iter()
        .enumerate()
        .map(|(i, kp)| {
            // The last transaction spends more than the sender holds.
            let amount = if i == 3 { 5_000 } else { 100 };
            verified(&store, &signed(kp, sink, amount, 0, 0))
        })
        .collect();

    let err = funds_state_change(&mut store, &txs, RollbackPolicy::Legacy).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    assert_eq!(balance(&store, &keys[0]), 1_000);
    assert_eq!(balance(&store, &keys[1]), 1_000);
    assert_eq!(balance(&store, &keys[2]), 900);
    assert_eq!(balance(&store, &keys[3]), 1_000);
    assert_eq!(balance(&store, sink), 100);
}

#[test]
fn test_inclusive_rollback_boundary() {
    let (mut store, keys) = funded_store(&[1_000, 1_000, 1_000, 0]);
    let sink = &keys[3];
    let txs = vec![
        verified(&store, &signed(&keys[0], sink, 100, 0, 0)),
        verified(&store, &signed(&keys[1], sink, 100, 0, 0)),
        verified(&store, &signed(&keys[2], sink, 100, 0, 7)),
    ];

    let err = funds_state_change(&mut store, &txs, RollbackPolicy::Inclusive).unwrap_err();
    assert!(matches!(err, LedgerError::SequenceMismatch { .. }));
    assert_eq!(balance(&store, sink), 0);
    assert_eq!(store.total_supply(), 3_000);
}

#[test]
fn test_tx_count_is_strictly_sequential() {
    let (mut store, keys) = funded_store(&[1_000, 0]);
    for count in 0..5 {
        let tx = verified(&store, &signed(&keys[0], &keys[1], 1, 0, count));
        funds_state_change(&mut store, &[tx], RollbackPolicy::Legacy).unwrap();
        let account = store.get_account(&keys[0].account_hash()).unwrap();
        assert_eq!(account.tx_count, count + 1);
    }

    // Replaying an old sequence number fails.
    let replay = verified(&store, &signed(&keys[0], &keys[1], 1, 0, 2));
    assert!(funds_state_change(&mut store, &[replay], RollbackPolicy::Legacy).is_err());
    // Skipping ahead fails too.
    let gap = verified(&store, &signed(&keys[0], &keys[1], 1, 0, 6));
    assert!(funds_state_change(&mut store, &[gap], RollbackPolicy::Legacy).is_err());
}

#[test]
fn test_balance_never_exceeds_max_money() {
    let (mut store, keys) = funded_store(&[10, MAX_MONEY]);
    let tx = verified(&store, &signed(&keys[0], &keys[1], 1, 0, 0));

    let err = funds_state_change(&mut store, &[tx], RollbackPolicy::Legacy).unwrap_err();
    assert!(matches!(err, LedgerError::BalanceOverflow { .. }));
    assert_eq!(balance(&store, &keys[1]), MAX_MONEY);

    let err = collect_reward(&mut store, 1, &keys[1].account_hash()).unwrap_err();
    assert!(matches!(err, LedgerError::BalanceOverflow { .. }));
    assert_eq!(balance(&store, &keys[1]), MAX_MONEY);
}

#[test]
fn test_root_mint_touches_only_root() {
    let (mut store, keys) = funded_store(&[250, 40, 7]);
    let root = &keys[0];
    store.add_root_key(Account::new(root.public_key));
    let snapshot: Vec<(Hash, u64)> = store.iter().map(|a| (a.hash, a.balance)).collect();

    let tx = verified(&store, &signed(root, &keys[1], 600, 11, 0));
    funds_state_change(&mut store, &[tx], RollbackPolicy::Legacy).unwrap();

    for (hash, before) in snapshot {
        let after = store.get_account(&hash).unwrap().balance;
        if hash == root.account_hash() {
            assert_eq!(after, before + 611);
        } else {
            assert_eq!(after, before);
        }
    }
}

#[test]
fn test_verification_survives_short_hash_collisions() {
    let (store, keys) = funded_store(&[500, 0]);

    // Rebuild the store with decoys sharing both prefixes, inserted first.
    let mut crowded = AccountStore::new();
    for kp in &keys {
        for _ in 0..3 {
            let mut decoy = Account::with_balance(Keypair::generate().public_key, 1);
            decoy.hash.0[..8].copy_from_slice(&kp.account_hash().0[..8]);
            crowded.put_account(decoy).unwrap();
        }
    }
    for account in store.iter() {
        crowded.put_account(account.clone()).unwrap();
    }
    assert_eq!(crowded.bucket_len(&keys[0].account_hash().short()), 4);

    let tx = signed(&keys[0], &keys[1], 100, 0, 0);
    let resolved = verified(&crowded, &tx);
    assert_eq!(resolved.from_hash(), keys[0].account_hash());
    assert_eq!(resolved.to_hash(), keys[1].account_hash());

    funds_state_change(&mut crowded, &[resolved], RollbackPolicy::Legacy).unwrap();
    assert_eq!(balance(&crowded, &keys[1]), 100);
    assert!(crowded.check_consistency().is_ok());
}

#[test]
fn test_wire_decoded_transaction_verifies() {
    let (store, keys) = funded_store(&[500, 0]);
    let bytes = signed(&keys[0], &keys[1], 10, 1, 0).encode();
    assert_eq!(bytes.len(), 90);

    let decoded = FundsTx::decode(&bytes).unwrap();
    assert!(verify_funds_tx(&store, &decoded).is_ok());
    assert!(FundsTx::decode(&bytes[..89]).is_err());
}

#[test]
fn test_merkle_root_shapes() {
    let (store, keys) = funded_store(&[1_000, 0]);
    let leaf = |count: u32| verified(&store, &signed(&keys[0], &keys[1], 1, 0, count)).hash();
    let (l1, l2, l3) = (leaf(0), leaf(1), leaf(2));
    let pair = |a: &Hash, b: &Hash| hash_concat(&[a.as_ref(), b.as_ref()]);

    assert_eq!(merkle_root(&[]), Hash([0u8; 32]));
    assert_eq!(merkle_root(&[l1]), pair(&l1, &l1));
    assert_eq!(merkle_root(&[l1, l2]), pair(&l1, &l2));
    assert_eq!(
        merkle_root(&[l1, l2, l3]),
        pair(&pair(&l1, &l2), &pair(&l3, &l3))
    );
    assert_ne!(merkle_root(&[l1, l2, l3]), merkle_root(&[l3, l2, l1]));
}

#[test]
fn test_config_block_size_change() {
    let root = Keypair::generate();
    let mut history = ParameterHistory::default();
    let before = history.active();
    let tx = ConfigTx::new(0, ParameterId::BlockSize.as_u8(), 4096, 0, 0, &root).unwrap();
    let block = Hash([9u8; 32]);

    assert!(config_state_change(
        &mut history,
        &[tx],
        block,
        &ParameterBounds::default()
    ));

    assert_eq!(history.len(), 2);
    let active = history.active();
    assert_eq!(active.block_hash, block);
    assert_eq!(active.block_size, 4096);
    assert_eq!(active.fee_minimum, before.fee_minimum);
    assert_eq!(active.diff_interval, before.diff_interval);
    assert_eq!(active.block_interval, before.block_interval);
    assert_eq!(active.block_reward, before.block_reward);
}

#[test]
fn test_concurrent_verification() {
    let (store, keys) = funded_store(&[1_000, 1_000, 1_000, 1_000]);
    let txs: Vec<FundsTx> = (0..keys.len())
        .map(|i| signed(&keys[i], &keys[(i + 1) % keys.len()], 5, 0, 0))
        .collect();

    let store = &store;
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = txs
            .iter()
            .map(|tx| scope.spawn(move || verify_funds_tx(store, tx)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, result) in results.into_iter().enumerate() {
        let resolved = result.unwrap();
        assert_eq!(resolved.from_hash(), keys[i].account_hash());
    }
}

#[test]
fn test_block_is_all_or_nothing() {
    let root = Keypair::generate();
    let miner = Keypair::generate();
    let alice = Keypair::generate();
    let mut ledger = Ledger::with_root(
        LedgerConfig::default().with_rollback_policy(RollbackPolicy::Legacy),
        root.public_key,
    );
    for kp in [&miner, &alice] {
        ledger
            .store_mut()
            .put_account(Account::with_balance(kp.public_key, 100))
            .unwrap();
    }
    let supply = ledger.store().total_supply();

    let block = BlockTransactions {
        funds: vec![
            signed(&alice, &miner, 10, 0, 0),
            signed(&alice, &miner, 10, 0, 1),
            signed(&alice, &miner, 10, 0, 1),
        ],
        ..Default::default()
    };
    let err = ledger
        .apply_block(Hash([1u8; 32]), &block, &miner.account_hash())
        .unwrap_err();

    assert!(matches!(err, LedgerError::SequenceMismatch { .. }));
    // Unlike a bare funds batch, a failed block keeps nothing.
    assert_eq!(ledger.store().total_supply(), supply);
    assert_eq!(
        ledger.get_account(&alice.account_hash()).unwrap().tx_count,
        0
    );
}
