use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        executor::{Executor, ResultSet},
    },
};

/// SET AUTOCOMMIT executor
pub struct SetAutoCommit {
    enabled: bool,
}

impl SetAutoCommit {
    pub fn new(enabled: bool) -> Box<Self> {
        Box::new(Self { enabled })
    }
}

impl<T: Transaction> Executor<T> for SetAutoCommit {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.set_auto_commit(self.enabled)?;
        Ok(ResultSet::SetAutoCommit {
            enabled: self.enabled,
        })
    }
}

/// START TRANSACTION executor
pub struct Begin;

impl<T: Transaction> Executor<T> for Begin {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.begin()?;
        Ok(ResultSet::Begin)
    }
}

/// COMMIT executor
pub struct Commit;

impl<T: Transaction> Executor<T> for Commit {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.commit()?;
        Ok(ResultSet::Commit)
    }
}

/// ROLLBACK executor
pub struct Rollback;

impl<T: Transaction> Executor<T> for Rollback {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.rollback()?;
        Ok(ResultSet::Rollback)
    }
}
