mod polling_scheduler_test;
