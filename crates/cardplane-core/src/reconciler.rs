use crate::condition::Condition;
use crate::connector::Connecter;
use crate::external::{ConnectionDetails, ExternalClient};
use crate::resource::ManagedResource;
use crate::CoreError;
use tracing::{debug, warn};

/// What a single reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created { connection_details: ConnectionDetails },
    Updated { connection_details: ConnectionDetails },
    UpToDate,
    Deleted,
}

impl ReconcileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Created { .. } => "created",
            ReconcileOutcome::Updated { .. } => "updated",
            ReconcileOutcome::UpToDate => "up-to-date",
            ReconcileOutcome::Deleted => "deleted",
        }
    }
}

/// Runs one pass of the lifecycle contract for one resource.
///
/// Scheduling, requeueing and rate limiting belong to the caller. Every
/// failure is written to the resource's Synced condition and returned.
pub struct Reconciler<C> {
    connecter: C,
}

impl<C> Reconciler<C> {
    pub fn new(connecter: C) -> Self {
        Self { connecter }
    }

    pub fn reconcile<R>(&self, resource: &mut R) -> Result<ReconcileOutcome, CoreError>
    where
        R: ManagedResource,
        C: Connecter<R>,
    {
        match self.pass(resource) {
            Ok(outcome) => {
                resource.set_condition(Condition::reconcile_success());
                debug!("reconciled {}: {}", resource.name(), outcome.label());
                Ok(outcome)
            }
            Err(e) => {
                warn!("reconcile of {} failed: {e}", resource.name());
                resource.set_condition(Condition::reconcile_error(e.to_string()));
                Err(e)
            }
        }
    }

    fn pass<R>(&self, resource: &mut R) -> Result<ReconcileOutcome, CoreError>
    where
        R: ManagedResource,
        C: Connecter<R>,
    {
        let client = self.connecter.connect(resource)?;

        if resource.deletion_requested() {
            resource.set_condition(Condition::deleting());
            client.delete(resource)?;
            return Ok(ReconcileOutcome::Deleted);
        }

        let observation = client.observe(resource)?;
        if !observation.resource_exists {
            resource.set_condition(Condition::creating());
            let creation = client.create(resource)?;
            return Ok(ReconcileOutcome::Created {
                connection_details: creation.connection_details,
            });
        }

        if !observation.resource_up_to_date {
            let update = client.update(resource)?;
            return Ok(ReconcileOutcome::Updated {
                connection_details: update.connection_details,
            });
        }

        Ok(ReconcileOutcome::UpToDate)
    }
}
