pub mod principle;
