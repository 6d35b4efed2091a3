//! Identity invariants over randomly generated accounts.

use dagnet_core::constants::{ADDRESS_LEN, ADDRESS_PREFIX};
use dagnet_core::envelope::{Transaction, TransactionValue, TransferValue};
use dagnet_core::types::TransactionRef;
use dagnet_crypto::{
    address_from_public_key, public_key_from_proof_id, verify_transaction, Account,
};

fn check_digit_holds(address: &str) -> bool {
    let tail = &address[4..];
    let digit_sum: u32 = tail.chars().filter_map(|c| c.to_digit(10)).sum();
    let check = address.as_bytes()[3] as char;
    check.to_digit(10) == Some(digit_sum % 9)
}

#[test]
fn every_generated_address_satisfies_the_format_rules() {
    for _ in 0..32 {
        let account = Account::generate();
        let address = account.address().as_str();
        assert!(address.starts_with(ADDRESS_PREFIX));
        assert_eq!(address.len(), ADDRESS_LEN);
        assert!(check_digit_holds(address), "check digit broken for {address}");
    }
}

#[test]
fn address_always_matches_public_key_derivation() {
    for _ in 0..8 {
        let account = Account::generate();
        assert_eq!(
            &address_from_public_key(account.public_key()),
            account.address()
        );
    }
}

#[test]
fn proof_id_round_trips_to_the_same_address() {
    let account = Account::generate();
    let public_key = public_key_from_proof_id(&account.public_key_hex()).unwrap();
    assert_eq!(&address_from_public_key(&public_key), account.address());
}

#[test]
fn any_account_can_sign_for_its_own_source() {
    for _ in 0..8 {
        let account = Account::generate();
        let unsigned = Transaction::unsigned(TransactionValue::Transfer(TransferValue {
            source: account.address().clone(),
            destination: Account::generate().address().clone(),
            amount: 1,
            fee: 0,
            salt: 7,
            parent: TransactionRef::genesis(),
            metagraph_id: None,
        }));
        let signed = account.sign_transaction(&unsigned).unwrap();
        verify_transaction(&signed).unwrap();
    }
}

#[test]
fn multiple_proofs_accumulate() {
    let primary = Account::generate();
    let cosigner = Account::generate();
    let unsigned = Transaction::unsigned(TransactionValue::Transfer(TransferValue {
        source: primary.address().clone(),
        destination: cosigner.address().clone(),
        amount: 5,
        fee: 0,
        salt: 1,
        parent: TransactionRef::genesis(),
        metagraph_id: None,
    }));

    let signed = primary.sign_transaction(&unsigned).unwrap();
    let cosigned = cosigner.sign_transaction(&signed).unwrap();
    assert_eq!(cosigned.proofs.len(), 2);
    // The source's own proof is present, so the envelope verifies.
    verify_transaction(&cosigned).unwrap();
}
