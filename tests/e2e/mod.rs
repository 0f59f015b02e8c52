// End-to-end tests for the ReplyGate backend API
//
// A single testcontainers PostgreSQL instance backs the whole suite. Each test
// leases an isolated database from the pool (test_db_<uuid>), gets its own
// server with stubbed reply generation and text extraction, file-backed guest
// storage in a temp dir, and a settable calendar date for daily-reset scenarios.

mod helpers;
mod test_account_quota;
mod test_history;
