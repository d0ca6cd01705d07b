mod bigquery_destination_test;
mod pipeline_test;
mod source_test;
