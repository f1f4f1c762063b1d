mod client_session_test;
