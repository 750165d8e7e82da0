// Candidate profile endpoints: create-or-update by primary email, lookup by id.

pub mod handlers;
