pub mod deadline_closer;
