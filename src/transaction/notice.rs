//! Success notices shown on the transactions page after a change.

use crate::{alert::Alert, database_id::TransactionId, endpoints};

/// What changed before redirecting back to the transactions page.
///
/// Notices travel in the query string, e.g. `?notice=edited&id=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Created,
    Edited(TransactionId),
    Deleted(TransactionId),
}

impl Notice {
    /// Read a notice from the `notice` and `id` query parameters.
    ///
    /// Unknown notices and edit or delete notices without an ID give `None`.
    pub fn from_params(notice: Option<&str>, id: Option<TransactionId>) -> Option<Self> {
        match (notice?, id) {
            ("created", _) => Some(Notice::Created),
            ("edited", Some(id)) => Some(Notice::Edited(id)),
            ("deleted", Some(id)) => Some(Notice::Deleted(id)),
            _ => None,
        }
    }

    /// The transactions page URL that displays this notice.
    pub fn redirect_url(self) -> String {
        let view = endpoints::TRANSACTIONS_VIEW;

        match self {
            Notice::Created => format!("{view}?notice=created"),
            Notice::Edited(id) => format!("{view}?notice=edited&id={id}"),
            Notice::Deleted(id) => format!("{view}?notice=deleted&id={id}"),
        }
    }

    pub fn message(self) -> String {
        match self {
            Notice::Created => "Transaction added successfully!".to_owned(),
            Notice::Edited(id) => format!("Successfully edited transaction #{id}!"),
            Notice::Deleted(id) => format!("Successfully deleted transaction #{id}!"),
        }
    }

    pub fn into_alert(self) -> Alert {
        Alert::SuccessSimple {
            message: self.message(),
        }
    }
}
