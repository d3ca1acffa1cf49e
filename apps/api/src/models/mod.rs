pub mod guardrail;
