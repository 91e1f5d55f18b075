//! The [`Recipient`] trait: the minimal shape the outbox delivery pipeline
//! needs from an actor, regardless of its concrete AS2 type.

use crate::types::{Application, Group, Organization, Person, Service};

/// An entity capable of receiving deliveries: it has an `id`, an `inbox`,
/// and may advertise a shared inbox for fan-out delivery.
pub trait Recipient {
    /// The actor's `id`.
    fn recipient_id(&self) -> Option<&str>;

    /// The actor's personal `inbox` URL.
    fn inbox_id(&self) -> Option<&str>;

    /// The actor's `endpoints.sharedInbox` URL, if advertised.
    fn shared_inbox_id(&self) -> Option<&str>;
}

macro_rules! impl_recipient {
    ($name:ident) => {
        impl Recipient for $name {
            fn recipient_id(&self) -> Option<&str> {
                self.id()
            }
            fn inbox_id(&self) -> Option<&str> {
                self.inbox()
            }
            fn shared_inbox_id(&self) -> Option<&str> {
                self.shared_inbox()
            }
        }
    };
}

impl_recipient!(Person);
impl_recipient!(Application);
impl_recipient!(Group);
impl_recipient!(Organization);
impl_recipient!(Service);
