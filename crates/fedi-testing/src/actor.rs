//! Generates a complete, internally-consistent actor fixture: a `Person`
//! entity with inbox/outbox/collection URLs and a published RSA key, plus
//! the private half of that key for signing test deliveries.

use fedi_crypto::{export_spki, generate_key_pair, KeyAlgorithm, KeyPair};
use fedi_vocab::codec::TypedEntity;
use fedi_vocab::types::{CryptographicKey, Person};
use fedi_vocab::Entity;
use std::sync::Arc;

/// One generated actor fixture.
pub struct TestActor {
    /// The `Person` entity, ready to serve from an actor dispatcher.
    pub entity: Entity,
    /// The `id` of the published key (`publicKey.id` / HTTP Signature
    /// `keyId`).
    pub key_id: String,
    /// The private keypair backing the published key, for signing
    /// deliveries or authorized fetches in tests.
    pub key_pair: Arc<KeyPair>,
}

/// Build a `Person` actor at `{base_url}/users/{handle}`, with a freshly
/// generated RSA keypair published under `publicKey`.
///
/// # Panics
///
/// Panics if RSA key generation or SPKI export fails — both
/// astronomically unlikely, and not worth threading a `Result` through
/// every test that wants an actor.
#[must_use]
pub fn generate_actor(base_url: &str, handle: &str) -> TestActor {
    let actor_id = format!("{base_url}/users/{handle}");
    let key_id = format!("{actor_id}#main-key");

    let pair = Arc::new(generate_key_pair(KeyAlgorithm::Rsa).expect("RSA key generation"));
    let public_pem = export_spki(&pair.public_key()).expect("SPKI export of a freshly generated key");

    let mut key = CryptographicKey::new();
    key.set_id(key_id.clone());
    key.set_owner(actor_id.clone());
    key.set_public_key_pem(public_pem);

    let mut person = Person::new();
    person.set_id(actor_id.clone());
    person.set_preferred_username(handle);
    person.set_inbox(format!("{actor_id}/inbox"));
    person.set_outbox(format!("{actor_id}/outbox"));
    person.set_following(format!("{actor_id}/following"));
    person.set_followers(format!("{actor_id}/followers"));
    person.set_public_key(vec![key.entity().to_value()]).expect("CryptographicKey is within publicKey's range");

    TestActor { entity: person.into_entity(), key_id, key_pair: pair }
}
